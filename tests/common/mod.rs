// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 集成测试共用的服务器启动器与原始 HTTP 客户端

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::Notify,
};
use webrouter::{api, server, Config, MemoryStore, Router};

pub const BASE_CONFIG: &str = "port = 0\nworker_threads = 1\nlocal = true\n";

/// 硬超时，防止测试用例因服务器挂起而永久阻塞
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Arc<Notify>,
}

/// 在随机端口上启动挂载了 `/items` 资源的服务器
pub async fn start_server(extra_config: &str) -> TestServer {
    let config = Config::from_toml_str(&format!("{}{}", BASE_CONFIG, extra_config));
    let mut router = Router::new().with_percent_decoding(config.percent_decode_query());
    api::register_routes(&mut router, Arc::new(MemoryStore::new())).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Notify::new());
    tokio::spawn(server::serve(
        listener,
        Arc::new(router),
        Arc::new(config),
        Arc::clone(&shutdown),
        Arc::new(Mutex::new(0)),
    ));
    TestServer { addr, shutdown }
}

/// 发送原始字节并读取直到服务器关闭连接
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> Result<Vec<u8>, String> {
    let mut stream = TcpStream::connect(addr).await.map_err(|e| e.to_string())?;
    stream.write_all(request).await.map_err(|e| e.to_string())?;

    let mut buffer = Vec::new();
    tokio::time::timeout(CLIENT_TIMEOUT, stream.read_to_end(&mut buffer))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())?;
    Ok(buffer)
}

pub async fn send_request(addr: SocketAddr, request: &str) -> Result<String, String> {
    let bytes = send_raw(addr, request.as_bytes()).await?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

/// 构造一个带 JSON 请求体的请求
pub fn json_request(method: &str, path: &str, body: &str) -> String {
    format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        method,
        path,
        body.len(),
        body
    )
}

pub fn simple_request(method: &str, path: &str) -> String {
    format!("{} {} HTTP/1.1\r\nHost: localhost\r\n\r\n", method, path)
}

/// 拆分为 (状态码, 标头, 响应体)
pub fn parse_response(response: &str) -> (u16, HashMap<String, String>, String) {
    let (head, body) = response.split_once("\r\n\r\n").unwrap_or((response, ""));
    let mut lines = head.split("\r\n");

    let status_code = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);

    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    (status_code, headers, body.to_string())
}
