// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应构建模块
//!
//! 处理器通过 `&mut Response` 写入状态码与响应体，连接处理器随后调用
//! [`Response::encode_for`] 做内容协商压缩，最后用 [`Response::as_bytes`] 序列化。

use crate::{param::*, request::Request};

use brotli::enc::{self, backward_references::BrotliEncoderParams};
use bytes::Bytes;
use chrono::prelude::*;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use log::{debug, error};
use serde_json::{json, Value};

use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    content_type: Option<String>,
    content_length: u64,
    date: DateTime<Utc>,
    content_encoding: Option<HttpEncoding>,
    server_name: String,
    allow: Option<Vec<HttpRequestMethod>>,
    content: Option<Bytes>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            content_type: None,
            content_length: 0,
            date: Utc::now(),
            content_encoding: None,
            server_name: SERVER_NAME.to_string(),
            allow: None,
            content: None,
        }
    }

    /// 设置状态码及对应的原因短语。
    ///
    /// 不在状态码表中的代码会被记录为错误，原因短语记为 `Unknown`。
    pub fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = match STATUS_CODES.get(&code) {
            Some(&info) => info.to_string(),
            None => {
                error!("非法的状态码：{}。这条错误说明处理器编写出现了错误。", code);
                "Unknown".to_string()
            }
        };
        self
    }

    /// 以 JSON 作为响应体
    pub fn set_json(&mut self, value: &Value) -> &mut Self {
        self.set_body(value.to_string().into_bytes(), "application/json")
    }

    /// 以纯文本作为响应体
    pub fn set_text(&mut self, text: &str) -> &mut Self {
        self.set_body(text.as_bytes().to_vec(), "text/plain;charset=utf-8")
    }

    fn set_body(&mut self, body: Vec<u8>, content_type: &str) -> &mut Self {
        self.content_length = body.len() as u64;
        self.content = Some(Bytes::from(body));
        self.content_type = Some(content_type.to_string());
        self.content_encoding = None;
        self
    }

    /// 清空响应体，用于 204 等不携带内容的响应
    pub fn clear_body(&mut self) -> &mut Self {
        self.content = None;
        self.content_type = None;
        self.content_encoding = None;
        self.content_length = 0;
        self
    }

    pub fn set_allow(&mut self, methods: Vec<HttpRequestMethod>) -> &mut Self {
        self.allow = Some(methods);
        self
    }

    fn set_date(&mut self) -> &mut Self {
        self.date = Utc::now();
        self
    }

    /// 以 `{"error": 原因短语, "status": 状态码}` 为响应体的错误响应
    pub fn from_status_code(code: u16, note: Option<&str>) -> Self {
        let mut response = Self::new();
        response.set_code(code);
        let message = note.unwrap_or(&response.information).to_string();
        response
            .set_json(&json!({ "error": message, "status": code }))
            .set_date()
            .to_owned()
    }

    pub fn response_400(note: Option<&str>) -> Self {
        Self::from_status_code(400, note)
    }

    pub fn response_404(request: &Request) -> Self {
        let note = format!("No route for {} {}", request.method(), request.path());
        Self::from_status_code(404, Some(&note))
    }

    pub fn response_405(allow: Vec<HttpRequestMethod>) -> Self {
        Self::from_status_code(405, None).set_allow(allow).to_owned()
    }

    pub fn response_413() -> Self {
        Self::from_status_code(413, None)
    }

    pub fn response_500() -> Self {
        Self::from_status_code(500, None)
    }

    /// 根据客户端的 `Accept-Encoding` 压缩响应体。
    ///
    /// 空响应体与已编码的响应体保持不变；压缩失败时退回未压缩内容。
    pub fn encode_for(&mut self, accept_encoding: &[HttpEncoding], id: u128) -> &mut Self {
        if self.content_encoding.is_some() {
            return self;
        }
        let Some(content) = self.content.as_ref().filter(|c| !c.is_empty()) else {
            return self;
        };
        let Some(encoding) = decide_encoding(accept_encoding) else {
            debug!("[ID{}]不进行压缩", id);
            return self;
        };
        match compress(content.to_vec(), Some(encoding)) {
            Ok(compressed) => {
                debug!(
                    "[ID{}]使用{}压缩，原始: {} bytes -> 压缩后: {} bytes",
                    id,
                    encoding,
                    content.len(),
                    compressed.len()
                );
                self.content_length = compressed.len() as u64;
                self.content = Some(Bytes::from(compressed));
                self.content_encoding = Some(encoding);
            }
            Err(e) => {
                error!("[ID{}]压缩响应体失败: {}，返回未压缩内容", id, e);
            }
        }
        self
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut header = format!(
            "{} {} {}{}",
            self.version, self.status_code, self.information, CRLF
        );
        if let Some(t) = &self.content_type {
            header.push_str(&format!("Content-Type: {}{}", t, CRLF));
        }
        if let Some(e) = self.content_encoding {
            header.push_str(&format!("Content-Encoding: {}{}", e, CRLF));
        }
        header.push_str(&format!("Content-Length: {}{}", self.content_length, CRLF));
        header.push_str(&format!("Date: {}{}", format_date(&self.date), CRLF));
        header.push_str(&format!("Server: {}{}", self.server_name, CRLF));
        if let Some(a) = &self.allow {
            let allow_str = a
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            header.push_str(&format!("Allow: {}{}", allow_str, CRLF));
        }
        header.push_str(&format!("Connection: close{}", CRLF));
        header.push_str(CRLF);

        let body: &[u8] = match &self.content {
            Some(c) => c,
            None => b"",
        };
        [header.as_bytes(), body].concat()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_encoding(&self) -> Option<HttpEncoding> {
        self.content_encoding
    }

    pub fn allow(&self) -> Option<&[HttpRequestMethod]> {
        self.allow.as_deref()
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}

fn compress(data: Vec<u8>, mode: Option<HttpEncoding>) -> io::Result<Vec<u8>> {
    match mode {
        Some(HttpEncoding::Gzip) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&data)?;
            encoder.finish()
        }
        Some(HttpEncoding::Br) => {
            let params = BrotliEncoderParams::default();
            let mut output = Vec::new();
            enc::BrotliCompress(&mut io::Cursor::new(data), &mut output, &params)?;
            Ok(output)
        }
        None => Ok(data),
    }
}

fn decide_encoding(accept_encoding: &[HttpEncoding]) -> Option<HttpEncoding> {
    if accept_encoding.contains(&HttpEncoding::Gzip) {
        Some(HttpEncoding::Gzip)
    } else if accept_encoding.contains(&HttpEncoding::Deflate) {
        Some(HttpEncoding::Deflate)
    } else if accept_encoding.contains(&HttpEncoding::Br) {
        Some(HttpEncoding::Br)
    } else {
        None
    }
}
