// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了路由器在注册阶段与请求处理生命周期中可能出现的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：涵盖了协议解析错误、路由模板配置错误以及请求体解析错误。
//! - **语义映射**：每个变体都对应特定的 HTTP 状态码，便于上层模块将其转化为响应。
//! - **快速失败**：模板错误在 `register` 时即被返回，而不是等到分发阶段。

use std::fmt;

/// 路由器与服务器处理过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行或标头不完整、格式错误。对应 `400 Bad Request`。
    MalformedRequest,
    /// 客户端使用了不在 GET/POST/PUT/PATCH/DELETE 之内的方法。对应 `405`。
    UnSupportedRequestMethod,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 请求总长度超过 `max_request_size`。对应 `413 Content Too Large`。
    RequestTooLarge,
    /// 路由模板中同一个参数名出现了两次，携带重复的参数名。
    DuplicateParameter(String),
    /// 路由模板无法编译为匹配器，携带原始模板。
    InvalidTemplate(String),
    /// 请求体不是合法的 JSON 对象。
    BodyIsNotJson,
}

use Exception::*;

impl Exception {
    /// 该异常在响应中对应的状态码。
    pub fn status_code(&self) -> u16 {
        match self {
            RequestIsNotUtf8 | MalformedRequest | UnsupportedHttpVersion | BodyIsNotJson => 400,
            UnSupportedRequestMethod => 405,
            RequestTooLarge => 413,
            DuplicateParameter(_) | InvalidTemplate(_) => 500,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequest => write!(f, "Malformed request"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            RequestTooLarge => write!(f, "Request too large (413)"),
            DuplicateParameter(name) => {
                write!(f, "Duplicate route parameter name: {}", name)
            }
            InvalidTemplate(template) => write!(f, "Invalid route template: {}", template),
            BodyIsNotJson => write!(f, "Request body is not a JSON object"),
        }
    }
}

impl std::error::Error for Exception {}
