// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路径模板编译模块
//!
//! 将形如 `/items/:id/tags/:tag` 的路由模板编译为带命名捕获组的正则匹配器：
//! 1. 每个 `:name`（name 仅由字母组成）被替换为匹配 `[a-z0-9\-_]+` 的命名捕获组。
//! 2. 变量之间的字面文本被转义后按原样匹配。
//! 3. 整个匹配锚定在路径首尾，末尾附加一个可选的 `?...` 查询串捕获组。
//!
//! 不符合模板的路径只是"不匹配"，不会产生错误。

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::exception::Exception;

/// 路由模板中标记变量段的字符
pub const PARAM_MARKER: char = ':';

/// 变量段允许的字符集合（一个或多个）
pub const PARAM_CHARSET: &str = r"[a-z0-9\-_]+";

/// 查询串捕获组的内部名称。用户参数名只含字母，因此不会与之冲突。
const QUERY_GROUP: &str = "__query";

lazy_static! {
    static ref PARAM_REGEX: Regex = Regex::new(r":([A-Za-z]+)").unwrap();
}

/// 一个已编译的路由模板。
///
/// 编译只在注册时发生一次，之后该对象只读。
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    regex: Regex,
    names: Vec<String>,
}

/// 一次成功匹配的结果。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathMatch {
    /// 参数名到取值的映射，键集合与模板声明的参数名完全一致
    pub params: HashMap<String, String>,
    /// 原始查询串，包含开头的 `?`
    pub query: Option<String>,
}

impl PathPattern {
    /// 编译路由模板。
    ///
    /// # 错误
    /// * `Exception::DuplicateParameter` - 同一参数名在模板中出现多次。
    /// * `Exception::InvalidTemplate` - 生成的正则无法编译。
    pub fn compile(template: &str) -> Result<Self, Exception> {
        let mut names: Vec<String> = Vec::new();
        let mut source = String::from("^");
        let mut last = 0;

        for caps in PARAM_REGEX.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();
            if names.iter().any(|n| n == name) {
                return Err(Exception::DuplicateParameter(name.to_string()));
            }
            source.push_str(&regex::escape(&template[last..whole.start()]));
            source.push_str(&format!("(?P<{}>{})", name, PARAM_CHARSET));
            names.push(name.to_string());
            last = whole.end();
        }
        source.push_str(&regex::escape(&template[last..]));
        source.push_str(&format!(r"(?P<{}>\?.*)?$", QUERY_GROUP));

        let regex = match Regex::new(&source) {
            Ok(r) => r,
            Err(e) => {
                debug!("模板{}生成的正则{}无法编译：{}", template, source, e);
                return Err(Exception::InvalidTemplate(template.to_string()));
            }
        };
        debug!("模板{}编译为{}", template, regex.as_str());

        Ok(Self {
            template: template.to_string(),
            regex,
            names,
        })
    }

    /// 测试路径是否匹配；匹配时返回参数和原始查询串。
    pub fn match_path(&self, path: &str) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;
        let mut params = HashMap::with_capacity(self.names.len());
        for name in &self.names {
            if let Some(value) = caps.name(name) {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }
        let query = caps.name(QUERY_GROUP).map(|q| q.as_str().to_string());
        Some(PathMatch { params, query })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// 模板中声明的参数名，按出现顺序排列
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_parameter() {
        let pattern = PathPattern::compile("/items/:id").unwrap();
        let m = pattern.match_path("/items/42").unwrap();
        assert_eq!(m.params.get("id"), Some(&"42".to_string()));
        assert_eq!(m.params.len(), 1);
        assert_eq!(m.query, None);
    }

    #[test]
    fn test_multiple_parameters() {
        let pattern = PathPattern::compile("/users/:user/posts/:post").unwrap();
        let m = pattern.match_path("/users/jane_doe/posts/my-first-post").unwrap();
        assert_eq!(m.params["user"], "jane_doe");
        assert_eq!(m.params["post"], "my-first-post");
        assert_eq!(pattern.names(), &["user".to_string(), "post".to_string()]);
    }

    #[test]
    fn test_query_string_capture() {
        let pattern = PathPattern::compile("/items/:id").unwrap();
        let m = pattern.match_path("/items/42?active=true").unwrap();
        assert_eq!(m.params["id"], "42");
        assert_eq!(m.query.as_deref(), Some("?active=true"));
    }

    #[test]
    fn test_literal_template_matches_exact_path_only() {
        let pattern = PathPattern::compile("/health").unwrap();
        assert!(pattern.is_match("/health"));
        assert!(pattern.is_match("/health?verbose"));
        assert!(!pattern.is_match("/health/"));
        assert!(!pattern.is_match("/healthz"));
        assert!(!pattern.is_match("/api/health"));
        assert!(pattern.match_path("/health").unwrap().params.is_empty());
    }

    #[test]
    fn test_missing_segment_does_not_match() {
        let pattern = PathPattern::compile("/items/:id").unwrap();
        assert!(pattern.match_path("/items/").is_none());
        assert!(pattern.match_path("/items").is_none());
    }

    #[test]
    fn test_characters_outside_charset_do_not_match() {
        let pattern = PathPattern::compile("/items/:id").unwrap();
        assert!(pattern.match_path("/items/ABC").is_none());
        assert!(pattern.match_path("/items/a.b").is_none());
        assert!(pattern.match_path("/items/a%20b").is_none());
        assert!(pattern.match_path("/items/42/extra").is_none());
    }

    #[test]
    fn test_literal_part_is_case_sensitive() {
        let pattern = PathPattern::compile("/Items/:id").unwrap();
        assert!(pattern.is_match("/Items/1"));
        assert!(!pattern.is_match("/items/1"));
    }

    #[test]
    fn test_regex_metacharacters_in_template_are_literal() {
        let pattern = PathPattern::compile("/v1.0/:name").unwrap();
        assert!(pattern.is_match("/v1.0/abc"));
        assert!(!pattern.is_match("/v1x0/abc"));
    }

    #[test]
    fn test_duplicate_parameter_is_rejected() {
        let result = PathPattern::compile("/a/:id/b/:id");
        assert_eq!(
            result.unwrap_err(),
            Exception::DuplicateParameter("id".to_string())
        );
    }

    #[test]
    fn test_parameter_named_query_does_not_collide() {
        let pattern = PathPattern::compile("/search/:query").unwrap();
        let m = pattern.match_path("/search/rust?page=2").unwrap();
        assert_eq!(m.params["query"], "rust");
        assert_eq!(m.query.as_deref(), Some("?page=2"));
    }

    #[test]
    fn test_parameter_name_stops_at_non_alphabetic() {
        let pattern = PathPattern::compile("/files/:name.json").unwrap();
        let m = pattern.match_path("/files/report.json").unwrap();
        assert_eq!(m.params["name"], "report");
        assert_eq!(pattern.template(), "/files/:name.json");
    }
}
