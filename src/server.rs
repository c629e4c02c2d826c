// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 连接处理模块
//!
//! 基于 Tokio 的 Accept 循环：每个 TCP 连接由一个独立任务处理，
//! 依次完成读取、解析、路由分发、压缩与写回，处理完一个请求后关闭连接。
//!
//! 路由表以 `Arc<Router>` 的形式只读共享，连接之间没有其他共享状态
//! （活跃连接计数除外）。

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::Notify,
};

use crate::{
    config::Config,
    exception::Exception,
    param::ALLOWED_METHODS,
    request::Request,
    response::Response,
    router::{Dispatch, Router},
};

/// 单次 `read` 的缓冲区大小
const READ_CHUNK: usize = 1024;

/// # 主事件循环 (Accept Loop)
///
/// 持续接收新连接并分发到 Tokio 线程池，直到 `shutdown` 收到 `notify_one`。
pub async fn serve(
    listener: TcpListener,
    router: Arc<Router>,
    config: Arc<Config>,
    shutdown: Arc<Notify>,
    active_connection: Arc<Mutex<u32>>,
) {
    let mut id: u128 = 0;

    loop {
        let accepted = tokio::select! {
            _ = shutdown.notified() => {
                info!("主循环接收到停机指令，正在退出...");
                break;
            }
            accepted = listener.accept() => accepted,
        };
        let (mut stream, addr) = match accepted {
            Ok(a) => a,
            Err(e) => {
                error!("接受TCP连接失败：{}", e);
                continue;
            }
        };
        debug!("[ID{}]新的连接：{}", id, addr);

        let router = Arc::clone(&router);
        let config = Arc::clone(&config);
        let active_connection = Arc::clone(&active_connection);

        tokio::spawn(async move {
            let _guard = ConnectionGuard::enter(active_connection);
            handle_connection(&mut stream, id, &router, &config).await;
        });
        id += 1;
    }
}

/// 活跃连接计数的 RAII 守卫：创建时加一，析构时减一，
/// 连接任务即使 panic 也会归还计数。
pub struct ConnectionGuard {
    counter: Arc<Mutex<u32>>,
}

impl ConnectionGuard {
    pub fn enter(counter: Arc<Mutex<u32>>) -> Self {
        if let Ok(mut lock) = counter.lock() {
            *lock += 1;
        }
        Self { counter }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let mut lock = match self.counter.lock() {
            Ok(lock) => lock,
            Err(poisoned) => poisoned.into_inner(),
        };
        *lock = lock.saturating_sub(1);
    }
}

/// # 连接处理器
///
/// 负责单个 TCP 流的生命周期：读取请求、分发路由、发送响应。
pub async fn handle_connection(stream: &mut TcpStream, id: u128, router: &Router, config: &Config) {
    let timeout = Duration::from_millis(config.read_timeout_ms());
    let read = tokio::time::timeout(timeout, read_request(stream, id, config.max_request_size()));
    let buffer = match read.await {
        Ok(Ok(Some(buffer))) => buffer,
        Ok(Ok(None)) => return, // 客户端未发送任何数据即关闭连接
        Ok(Err(e)) => {
            warn!("[ID{}]读取请求失败：{}", id, e);
            write_response(stream, id, &error_response(&e)).await;
            return;
        }
        Err(_) => {
            warn!("[ID{}]读取请求超时（{}ms），返回408", id, config.read_timeout_ms());
            write_response(stream, id, &Response::from_status_code(408, None)).await;
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕，共{}字节", id, buffer.len());

    let start_time = Instant::now();

    let request = match Request::try_from(&buffer, id) {
        Ok(req) => req,
        Err(Exception::UnSupportedRequestMethod) => {
            warn!("[ID{}]不支持的请求方法，返回405", id);
            let response = Response::response_405(ALLOWED_METHODS.to_vec());
            write_response(stream, id, &response).await;
            return;
        }
        Err(e) => {
            warn!("[ID{}]解析HTTP请求失败：{}", id, e);
            write_response(stream, id, &error_response(&e)).await;
            return;
        }
    };

    let response = respond(router, &request, id, config.compression());

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );
    info!(
        "[ID{}] {}, {}, {}, {}, {}, {}",
        id,
        request.version(),
        request.path(),
        request.method(),
        response.status_code(),
        response.information(),
        request.user_agent(),
    );

    write_response(stream, id, &response).await;
}

/// 分发请求并生成最终响应。
///
/// 没有路由匹配时：若路径在其他方法下可以匹配，返回 405 并附带 `Allow`；否则返回 404。
pub fn respond(router: &Router, request: &Request, id: u128, compression: bool) -> Response {
    let mut response = Response::new();
    if router.dispatch(request, &mut response, id) == Dispatch::NoMatch {
        let allowed = router.allowed_methods(request.path());
        response = if allowed.is_empty() {
            warn!("[ID{}]请求的路径：{} 没有路由，返回404", id, request.path());
            Response::response_404(request)
        } else {
            warn!(
                "[ID{}]路径{}不接受{}方法，返回405",
                id,
                request.path(),
                request.method()
            );
            Response::response_405(allowed)
        };
    }
    if compression {
        response.encode_for(request.accept_encoding(), id);
    }
    response
}

/// 将读取或解析阶段的异常转换为对应的错误响应
pub fn error_response(e: &Exception) -> Response {
    match e.status_code() {
        400 => Response::response_400(Some(&e.to_string())),
        413 => Response::response_413(),
        500 => Response::response_500(),
        code => Response::from_status_code(code, Some(&e.to_string())),
    }
}

/// 读取一个完整的请求（头 + `Content-Length` 指定的体）。
///
/// 连接在发送任何数据前被关闭时返回 `Ok(None)`。
async fn read_request(
    stream: &mut TcpStream,
    id: u128,
    max_request_size: usize,
) -> Result<Option<Vec<u8>>, Exception> {
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        match Request::expected_length(&buffer) {
            Some(total) if total > max_request_size => {
                warn!("[ID{}]请求声明的长度{}超过上限{}", id, total, max_request_size);
                return Err(Exception::RequestTooLarge);
            }
            Some(total) if buffer.len() >= total => {
                buffer.truncate(total);
                return Ok(Some(buffer));
            }
            None if buffer.len() > max_request_size => {
                warn!("[ID{}]请求头超过上限{}字节", id, max_request_size);
                return Err(Exception::RequestTooLarge);
            }
            _ => {}
        }

        let n = match stream.read(&mut chunk).await {
            Ok(n) => n,
            Err(e) => {
                error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
                return Ok(None);
            }
        };
        if n == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            warn!("[ID{}]连接在请求完整前关闭", id);
            return Err(Exception::MalformedRequest);
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
}

async fn write_response(stream: &mut TcpStream, id: u128, response: &Response) {
    let response_bytes = response.as_bytes();
    debug!("[ID{}]发送响应，长度: {}", id, response_bytes.len());
    if let Err(e) = stream.write_all(&response_bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
    let _ = stream.shutdown().await;
}
