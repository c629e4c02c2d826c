// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 查询串解码模块
//!
//! 将 `?a=1&b=2` 形式的原始查询串解码为扁平的键值映射。
//!
//! 默认不对 `%XX` 转义做 URL 解码，这是有意保留的限制；
//! 需要解码时使用 [`decode_with`] 并传入 `true`。

use std::collections::HashMap;

use log::debug;

/// 查询参数映射。缺少 `=` 的段落对应的值为 `None`。
pub type QueryMap = HashMap<String, Option<String>>;

/// 解码原始查询串，不做百分号解码。
///
/// ```
/// use webrouter::query::decode;
///
/// let query = decode("?a=1&b=2");
/// assert_eq!(query["a"].as_deref(), Some("1"));
/// assert!(decode("").is_empty());
/// ```
pub fn decode(raw: &str) -> QueryMap {
    decode_with(raw, false)
}

/// 解码原始查询串。
///
/// * 开头的 `?` 可有可无；
/// * 按 `&` 切分，空段落被跳过；
/// * 每段按第一个 `=` 切分为键和值，后出现的重复键覆盖先前的值；
/// * `percent_decode` 为真时对键和值做百分号解码，非法序列保持原样。
pub fn decode_with(raw: &str, percent_decode: bool) -> QueryMap {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut map = QueryMap::new();

    for segment in raw.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = match segment.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => {
                debug!("查询段{}缺少'='，值记为空", segment);
                (segment, None)
            }
        };
        let (key, value) = if percent_decode {
            (unescape(key), value.map(unescape))
        } else {
            (key.to_string(), value.map(str::to_string))
        };
        map.insert(key, value);
    }
    map
}

fn unescape(text: &str) -> String {
    match urlencoding::decode(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => text.to_string(),
    }
}
