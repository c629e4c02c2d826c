// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由演示服务器
//!
//! 初始化日志与配置，在多线程 Tokio 运行时上启动 `/items` JSON 资源，
//! 并提供一个后台管理控制台（CLI 指令交互）。

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::{Arc, Mutex},
    time::Duration,
};

use log::{error, info};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
    runtime::Builder,
    sync::Notify,
};

use webrouter::{api, server, Config, ItemStore, MemoryStore, Router};

/// # 程序入口点
fn main() {
    // 1. 日志系统：log4rs 通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
    }

    // 2. 运行参数
    let config = Config::from_toml("config/development.toml");
    info!("配置文件已载入");

    // 3. 根据配置文件分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("无法构建Tokio运行时：{}", e);
            return;
        }
    };

    runtime.block_on(run(config));
    // 控制台任务可能仍阻塞在 stdin 上
    runtime.shutdown_timeout(Duration::from_secs(1));
}

async fn run(config: Config) {
    // 4. 路由表：启动阶段一次性注册，之后只读共享
    let store: Arc<dyn ItemStore> = Arc::new(MemoryStore::new());
    let mut router = Router::new().with_percent_decoding(config.percent_decode_query());
    if let Err(e) = api::register_routes(&mut router, store) {
        error!("路由注册失败：{}", e);
        return;
    }
    info!("共注册{}条路由", router.len());
    let router = Arc::new(router);

    // 5. 网络层：支持全地址监听 (0.0.0.0) 或本地回环监听 (127.0.0.1)
    let port = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    let socket = SocketAddrV4::new(address, port);
    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return;
        }
    };
    info!("服务端将在{}上监听Socket连接", socket);

    // 6. 生命周期管理
    let shutdown = Arc::new(Notify::new());
    let active_connection = Arc::new(Mutex::new(0u32));

    tokio::spawn(console(
        Arc::clone(&shutdown),
        Arc::clone(&active_connection),
        Arc::clone(&router),
    ));
    tokio::spawn({
        let shutdown = Arc::clone(&shutdown);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("收到Ctrl-C，准备停机");
                shutdown.notify_one();
            }
        }
    });

    server::serve(
        listener,
        router,
        Arc::new(config),
        shutdown,
        active_connection,
    )
    .await;
    info!("服务器已停止");
}

/// 交互式管理控制台，不阻塞监听循环
async fn console(shutdown: Arc<Notify>, active_connection: Arc<Mutex<u32>>, router: Arc<Router>) {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        match input.trim() {
            "stop" => {
                shutdown.notify_one();
                println!("停机指令已激活，服务器将停止接受新连接...");
                break;
            }
            "help" => {
                println!("== Webrouter Help ==");
                println!("stop   - 发出停机信号");
                println!("status - 查看当前服务器运行状态");
                println!("routes - 按匹配顺序列出路由表");
                println!("help   - 显示此帮助信息");
                println!("====================");
            }
            "status" => {
                let active_count = active_connection.lock().map(|n| *n).unwrap_or(0);
                println!("== Webrouter 状态 ===");
                println!("当前活跃连接数: {}", active_count);
                println!("====================");
            }
            "routes" => {
                println!("== 路由表 ==========");
                for (index, route) in router.routes().iter().enumerate() {
                    println!("{:>3}  {:<6} {}", index, route.method().to_string(), route.template());
                }
                println!("====================");
            }
            "" => {}
            cmd => {
                println!("无效的命令：{}", cmd);
            }
        }
    }
}
