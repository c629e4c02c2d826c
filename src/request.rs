// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求处理模块
//!
//! 负责将 TCP 流中读取的原始字节解析为强类型的 `Request` 结构体。它涵盖了：
//! 1. 请求行（Request-Line）的解析（方法、路径、版本）。
//! 2. 常用 HTTP 标头（Headers）的提取。
//! 3. 按 `Content-Length` 截取请求体（Body）。
//! 4. 内容协商（Content Negotiation）相关的编码解析。

use crate::{exception::Exception, param::*};
use log::error;

/// 表示一个完整的 HTTP 请求，包括请求体。
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP 请求方法
    method: HttpRequestMethod,
    /// 请求的资源路径（包含查询字符串），即路由器看到的 url
    path: String,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 客户端标识字符串
    user_agent: String,
    /// 客户端支持的压缩编码列表（按解析顺序排列）
    accept_encoding: Vec<HttpEncoding>,
    /// 客户端接受的内容类型（MIME）
    accept: Option<String>,
    /// 请求体的内容类型
    content_type: Option<String>,
    /// 请求体
    body: String,
}

impl Request {
    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 参数
    /// * `buffer` - 从网络 Socket 读取的原始数据。
    /// * `id` - 连接 ID，用于在多线程环境下追踪日志。
    ///
    /// # 错误处理
    /// 请求格式不符合 HTTP 规范或使用了不支持的方法/版本时返回相应的 `Exception`。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let request_string = match std::str::from_utf8(buffer) {
            Ok(string) => string,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let (head, rest) = match request_string.split_once(HEADER_END) {
            Some((h, r)) => (h, r),
            None => (request_string.trim_end_matches(CRLF), ""),
        };
        let request_lines: Vec<&str> = head.split(CRLF).collect();

        // 1. 请求行 (e.g., "GET /items/42 HTTP/1.1")
        let first_line_parts: Vec<&str> = request_lines[0].split(' ').collect();
        if first_line_parts.len() != 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_lines[0]);
            return Err(Exception::MalformedRequest);
        }

        let method = match first_line_parts[0].parse::<HttpRequestMethod>() {
            Ok(m) => m,
            Err(e) => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, first_line_parts[0]);
                return Err(e);
            }
        };

        let version_str = first_line_parts[2].to_uppercase();
        let version = match version_str.as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            _ => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, &version_str);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        let path = first_line_parts[1].to_string();
        if !path.starts_with('/') {
            error!("[ID{}]请求路径不是绝对路径：{}", id, &path);
            return Err(Exception::MalformedRequest);
        }

        // 2. 标头
        let mut user_agent = "".to_string();
        let mut accept_encoding = vec![];
        let mut accept = None;
        let mut content_type = None;
        let mut content_length = None;
        for line in &request_lines[1..] {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_lowercase().as_str() {
                "user-agent" => user_agent = value.to_string(),
                "accept" => accept = Some(value.to_string()),
                "content-type" => content_type = Some(value.to_string()),
                "content-length" => {
                    // 多个 Content-Length 会让报文边界产生歧义
                    if content_length.is_some() {
                        error!("[ID{}]重复的Content-Length标头", id);
                        return Err(Exception::MalformedRequest);
                    }
                    match value.parse::<usize>() {
                        Ok(len) => content_length = Some(len),
                        Err(_) => {
                            error!("[ID{}]非法的Content-Length：{}", id, value);
                            return Err(Exception::MalformedRequest);
                        }
                    }
                }
                "accept-encoding" => {
                    // 只要包含关键词即视为支持
                    if value.contains("gzip") {
                        accept_encoding.push(HttpEncoding::Gzip);
                    }
                    if value.contains("deflate") {
                        accept_encoding.push(HttpEncoding::Deflate);
                    }
                    if value.contains("br") {
                        accept_encoding.push(HttpEncoding::Br);
                    }
                }
                _ => {}
            }
        }

        // 3. 请求体：以 Content-Length 为准，缺省时视为空
        let body = match content_length {
            Some(len) if len <= rest.len() => match rest.get(..len) {
                Some(b) => b.to_string(),
                None => return Err(Exception::MalformedRequest),
            },
            Some(len) => {
                error!("[ID{}]请求体不完整：期望{}字节，实际{}字节", id, len, rest.len());
                return Err(Exception::MalformedRequest);
            }
            None => "".to_string(),
        };

        Ok(Self {
            method,
            path,
            version,
            user_agent,
            accept_encoding,
            accept,
            content_type,
            body,
        })
    }

    /// 若缓冲区中已包含完整的请求头，返回整个请求（头 + 体）应有的字节数。
    ///
    /// 连接读取循环据此判断何时停止读取。请求头尚未结束时返回 `None`。
    ///
    /// 长度溢出时返回 `usize::MAX`，由调用方按超限处理。出现多个或非法的
    /// `Content-Length` 时只计算请求头长度，交给 [`Request::try_from`] 拒绝。
    pub fn expected_length(buffer: &[u8]) -> Option<usize> {
        let marker = HEADER_END.as_bytes();
        let head_end = buffer
            .windows(marker.len())
            .position(|w| w == marker)?
            + marker.len();
        let head = String::from_utf8_lossy(&buffer[..head_end]);
        let mut lengths = head
            .split(CRLF)
            .filter_map(|line| line.split_once(':'))
            .filter(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .map(|(_, value)| value.trim().parse::<usize>().ok());
        let content_length = match (lengths.next(), lengths.next()) {
            (Some(Some(len)), None) => len,
            _ => 0,
        };
        Some(head_end.checked_add(content_length).unwrap_or(usize::MAX))
    }
}

// --- Getter 访问器实现 ---

impl Request {
    pub fn version(&self) -> &HttpVersion {
        &self.version
    }

    /// 获取请求路径（含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// 获取客户端支持的压缩算法列表
    pub fn accept_encoding(&self) -> &[HttpEncoding] {
        &self.accept_encoding
    }

    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
