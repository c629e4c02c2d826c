// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 数据存储模块
//!
//! 路由处理器背后的存储。`ItemStore` 只暴露 select/insert/update/delete 四类操作，
//! 具体实现独占其内部数据。`MemoryStore` 是一个以 `Mutex<Vec<Item>>` 保存数据的内存实现。

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use log::{debug, warn};
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// 一条记录：服务端生成的 `id` 加上任意 JSON 字段
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// 记录存储接口。实现需要能在多个工作线程间共享。
#[cfg_attr(test, mockall::automock)]
pub trait ItemStore: Send + Sync {
    /// 查询记录。`filter` 中每个键都必须命中：字段的字符串形式包含给定值（忽略大小写）。
    /// 空过滤条件返回全部记录。
    fn select(&self, filter: &HashMap<String, String>) -> Vec<Item>;

    fn select_one(&self, id: &str) -> Option<Item>;

    /// 新增记录并返回它，`id` 由存储生成
    fn insert(&self, fields: Map<String, Value>) -> Item;

    /// 以新字段整体替换记录，记录不存在时返回 `None`
    fn update(&self, id: &str, fields: Map<String, Value>) -> Option<Item>;

    /// 删除记录，返回是否确实删除了
    fn delete(&self, id: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Vec<Item>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> MutexGuard<'_, Vec<Item>> {
        match self.items.lock() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("存储锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        }
    }
}

/// 客户端不能自行指定 `id`
fn strip_id(mut fields: Map<String, Value>) -> Map<String, Value> {
    fields.remove("id");
    fields
}

fn field_contains(item: &Item, key: &str, needle: &str) -> bool {
    let haystack = match key {
        "id" => item.id.clone(),
        _ => match item.fields.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => return false,
        },
    };
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl ItemStore for MemoryStore {
    fn select(&self, filter: &HashMap<String, String>) -> Vec<Item> {
        let items = self.items();
        let selected: Vec<Item> = items
            .iter()
            .filter(|item| {
                filter
                    .iter()
                    .all(|(key, needle)| field_contains(item, key, needle))
            })
            .cloned()
            .collect();
        debug!("select: 过滤条件{:?}，命中{}/{}条", filter, selected.len(), items.len());
        selected
    }

    fn select_one(&self, id: &str) -> Option<Item> {
        self.items().iter().find(|item| item.id == id).cloned()
    }

    fn insert(&self, fields: Map<String, Value>) -> Item {
        let item = Item {
            id: Uuid::new_v4().to_string(),
            fields: strip_id(fields),
        };
        self.items().push(item.clone());
        debug!("insert: 新增记录{}", item.id);
        item
    }

    fn update(&self, id: &str, fields: Map<String, Value>) -> Option<Item> {
        let mut items = self.items();
        let item = items.iter_mut().find(|item| item.id == id)?;
        item.fields = strip_id(fields);
        debug!("update: 更新记录{}", id);
        Some(item.clone())
    }

    fn delete(&self, id: &str) -> bool {
        let mut items = self.items();
        let before = items.len();
        items.retain(|item| item.id != id);
        let deleted = items.len() != before;
        debug!("delete: 记录{}，删除结果{}", id, deleted);
        deleted
    }
}
