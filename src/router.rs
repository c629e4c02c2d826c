// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由分发模块
//!
//! `Router` 维护一个按注册顺序排列的 (方法, 编译后的模板, 处理器) 列表。
//! 分发时按顺序扫描，第一个方法相同且模板匹配的路由胜出，
//! 其参数与解码后的查询串被放入一个新的 [`RequestContext`] 交给处理器。
//!
//! 没有路由匹配时返回 [`Dispatch::NoMatch`]，由调用方决定如何回应（通常是 404）。
//! 路由表在启动阶段注册完毕后只读，可以放在 `Arc` 中被多个工作线程共享。

use std::{collections::HashMap, fmt};

use log::{debug, info};

use crate::{
    exception::Exception,
    param::HttpRequestMethod,
    pattern::PathPattern,
    query::{self, QueryMap},
    request::Request,
    response::Response,
};

/// 路由处理器：接收请求上下文、原始请求和待写入的响应。
pub type Handler = Box<dyn Fn(&RequestContext, &Request, &mut Response) + Send + Sync>;

/// 路由表中的一项，注册后不可变。
pub struct Route {
    method: HttpRequestMethod,
    pattern: PathPattern,
    handler: Handler,
}

impl Route {
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn template(&self) -> &str {
        self.pattern.template()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template())
            .finish()
    }
}

/// 单次请求的解析上下文，每次分发时新建，处理器返回后丢弃。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    params: HashMap<String, String>,
    query: QueryMap,
}

impl RequestContext {
    pub fn new(params: HashMap<String, String>, query: QueryMap) -> Self {
        Self { params, query }
    }

    /// 路由参数
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// 查询参数的值。键存在但没有 `=` 时同样返回 `None`，需要区分时使用 [`Self::has_query`]。
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).and_then(|v| v.as_deref())
    }

    pub fn has_query(&self, name: &str) -> bool {
        self.query.contains_key(name)
    }

    pub fn query_map(&self) -> &QueryMap {
        &self.query
    }
}

/// 分发结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    /// 找到路由并已执行处理器
    Handled,
    /// 没有任何路由匹配，响应未被修改
    NoMatch,
}

#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    percent_decode: bool,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否对查询串做百分号解码，默认关闭
    pub fn with_percent_decoding(mut self, enabled: bool) -> Self {
        self.percent_decode = enabled;
        self
    }

    /// 注册一条路由并追加到路由表末尾。
    ///
    /// 模板在此时编译；重复的参数名等配置错误会立即返回，而不是推迟到分发阶段。
    pub fn register<F>(
        &mut self,
        method: HttpRequestMethod,
        template: &str,
        handler: F,
    ) -> Result<&mut Self, Exception>
    where
        F: Fn(&RequestContext, &Request, &mut Response) + Send + Sync + 'static,
    {
        let pattern = PathPattern::compile(template)?;
        info!("注册路由：{} {}", method, template);
        self.routes.push(Route {
            method,
            pattern,
            handler: Box::new(handler),
        });
        Ok(self)
    }

    pub fn get<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, Exception>
    where
        F: Fn(&RequestContext, &Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(HttpRequestMethod::Get, template, handler)
    }

    pub fn post<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, Exception>
    where
        F: Fn(&RequestContext, &Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(HttpRequestMethod::Post, template, handler)
    }

    pub fn put<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, Exception>
    where
        F: Fn(&RequestContext, &Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(HttpRequestMethod::Put, template, handler)
    }

    pub fn patch<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, Exception>
    where
        F: Fn(&RequestContext, &Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(HttpRequestMethod::Patch, template, handler)
    }

    pub fn delete<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, Exception>
    where
        F: Fn(&RequestContext, &Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(HttpRequestMethod::Delete, template, handler)
    }

    /// 按注册顺序查找第一个匹配的路由，并构建请求上下文。
    pub fn find(&self, method: HttpRequestMethod, url: &str) -> Option<(&Route, RequestContext)> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                let matched = route.pattern.match_path(url)?;
                let query = match matched.query {
                    Some(raw) => query::decode_with(&raw, self.percent_decode),
                    None => QueryMap::new(),
                };
                Some((route, RequestContext::new(matched.params, query)))
            })
    }

    /// 分发请求。匹配时执行处理器并返回 `Dispatch::Handled`。
    pub fn dispatch(&self, request: &Request, response: &mut Response, id: u128) -> Dispatch {
        match self.find(request.method(), request.path()) {
            Some((route, context)) => {
                debug!(
                    "[ID{}]{} {} 匹配路由 {}，参数：{:?}",
                    id,
                    request.method(),
                    request.path(),
                    route.template(),
                    context.params()
                );
                (route.handler)(&context, request, response);
                Dispatch::Handled
            }
            None => {
                debug!("[ID{}]{} {} 没有匹配的路由", id, request.method(), request.path());
                Dispatch::NoMatch
            }
        }
    }

    /// 路径能匹配、但方法不同的所有路由方法，按注册顺序去重。
    ///
    /// 非空时调用方可以回应 405 并附带 `Allow` 头，而不是 404。
    pub fn allowed_methods(&self, url: &str) -> Vec<HttpRequestMethod> {
        let mut methods = Vec::new();
        for route in &self.routes {
            if !methods.contains(&route.method) && route.pattern.is_match(url) {
                methods.push(route.method);
            }
        }
        methods
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
