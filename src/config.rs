// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    port: u16,
    worker_threads: usize,
    local: bool,
    #[serde(default = "default_max_request_size")]
    max_request_size: usize,
    #[serde(default = "default_read_timeout_ms")]
    read_timeout_ms: u64,
    #[serde(default = "default_compression")]
    compression: bool,
    #[serde(default)]
    percent_decode_query: bool,
}

fn default_max_request_size() -> usize {
    1048576 // 1MB
}

fn default_read_timeout_ms() -> u64 {
    5000
}

fn default_compression() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 7878,
            worker_threads: 0,
            local: true,
            max_request_size: default_max_request_size(),
            read_timeout_ms: default_read_timeout_ms(),
            compression: default_compression(),
            percent_decode_query: false,
        }
    }

    // 读取失败或格式错误时退回默认配置
    pub fn from_toml(filename: &str) -> Self {
        let str_val = match fs::read_to_string(filename) {
            Ok(s) => s,
            Err(e) => {
                error!("无法读取配置文件{}：{}，使用默认配置", filename, e);
                return Config::new().normalized();
            }
        };
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(str_val: &str) -> Self {
        let raw_config = match toml::from_str::<Config>(str_val) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象：{}，使用默认配置", e);
                Config::new()
            }
        };
        raw_config.normalized()
    }

    fn normalized(mut self) -> Self {
        if self.worker_threads == 0 {
            self.worker_threads = num_cpus::get();
        }
        if self.max_request_size == 0 {
            warn!("max_request_size被设置为0，这将拒绝所有请求，因此该值将被改为默认值。");
            self.max_request_size = default_max_request_size();
        }
        self
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn max_request_size(&self) -> usize {
        self.max_request_size
    }

    pub fn read_timeout_ms(&self) -> u64 {
        self.read_timeout_ms
    }

    pub fn compression(&self) -> bool {
        self.compression
    }

    pub fn percent_decode_query(&self) -> bool {
        self.percent_decode_query
    }
}
