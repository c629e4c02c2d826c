// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # `/items` 资源
//!
//! 在路由器上注册一组 JSON CRUD 路由，数据来自任意 [`ItemStore`] 实现：
//!
//! | 方法   | 模板          | 成功   | 失败                |
//! |--------|---------------|--------|---------------------|
//! | GET    | `/items`      | 200    |                     |
//! | GET    | `/items/:id`  | 200    | 404                 |
//! | POST   | `/items`      | 201    | 400（请求体非 JSON）|
//! | PUT    | `/items/:id`  | 200    | 400 / 404           |
//! | PATCH  | `/items/:id`  | 200    | 400 / 404           |
//! | DELETE | `/items/:id`  | 204    | 404                 |

use std::{collections::HashMap, sync::Arc};

use log::warn;
use serde_json::{json, Map, Value};

use crate::{
    exception::Exception,
    request::Request,
    response::Response,
    router::{RequestContext, Router},
    store::ItemStore,
};

pub const COLLECTION: &str = "/items";
pub const MEMBER: &str = "/items/:id";

pub fn register_routes(router: &mut Router, store: Arc<dyn ItemStore>) -> Result<(), Exception> {
    let s = Arc::clone(&store);
    router.get(COLLECTION, move |ctx, req, res| list(s.as_ref(), ctx, req, res))?;
    let s = Arc::clone(&store);
    router.get(MEMBER, move |ctx, req, res| show(s.as_ref(), ctx, req, res))?;
    let s = Arc::clone(&store);
    router.post(COLLECTION, move |ctx, req, res| create(s.as_ref(), ctx, req, res))?;
    let s = Arc::clone(&store);
    router.put(MEMBER, move |ctx, req, res| replace(s.as_ref(), ctx, req, res))?;
    let s = Arc::clone(&store);
    router.patch(MEMBER, move |ctx, req, res| merge(s.as_ref(), ctx, req, res))?;
    let s = store;
    router.delete(MEMBER, move |ctx, req, res| remove(s.as_ref(), ctx, req, res))?;
    Ok(())
}

fn list(store: &dyn ItemStore, ctx: &RequestContext, _req: &Request, res: &mut Response) {
    // 只有带值的查询参数参与过滤
    let filter: HashMap<String, String> = ctx
        .query_map()
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
        .collect();
    let items = store.select(&filter);
    res.set_code(200).set_json(&json!(items));
}

fn show(store: &dyn ItemStore, ctx: &RequestContext, _req: &Request, res: &mut Response) {
    let id = ctx.param("id").unwrap_or_default();
    match store.select_one(id) {
        Some(item) => {
            res.set_code(200).set_json(&json!(item));
        }
        None => not_found(res, id),
    }
}

fn create(store: &dyn ItemStore, _ctx: &RequestContext, req: &Request, res: &mut Response) {
    match parse_fields(req) {
        Ok(fields) => {
            let item = store.insert(fields);
            res.set_code(201).set_json(&json!(item));
        }
        Err(e) => write_error(res, e),
    }
}

fn replace(store: &dyn ItemStore, ctx: &RequestContext, req: &Request, res: &mut Response) {
    let id = ctx.param("id").unwrap_or_default();
    let fields = match parse_fields(req) {
        Ok(f) => f,
        Err(e) => return write_error(res, e),
    };
    match store.update(id, fields) {
        Some(item) => {
            res.set_code(200).set_json(&json!(item));
        }
        None => not_found(res, id),
    }
}

fn merge(store: &dyn ItemStore, ctx: &RequestContext, req: &Request, res: &mut Response) {
    let id = ctx.param("id").unwrap_or_default();
    let patch = match parse_fields(req) {
        Ok(f) => f,
        Err(e) => return write_error(res, e),
    };
    let Some(existing) = store.select_one(id) else {
        return not_found(res, id);
    };
    let mut fields = existing.fields;
    fields.extend(patch);
    match store.update(id, fields) {
        Some(item) => {
            res.set_code(200).set_json(&json!(item));
        }
        None => not_found(res, id),
    }
}

fn remove(store: &dyn ItemStore, ctx: &RequestContext, _req: &Request, res: &mut Response) {
    let id = ctx.param("id").unwrap_or_default();
    if store.delete(id) {
        res.set_code(204).clear_body();
    } else {
        not_found(res, id);
    }
}

fn parse_fields(request: &Request) -> Result<Map<String, Value>, Exception> {
    match serde_json::from_str::<Value>(request.body()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => {
            warn!("请求体是合法 JSON，但不是对象");
            Err(Exception::BodyIsNotJson)
        }
        Err(e) => {
            warn!("无法解析请求体：{}", e);
            Err(Exception::BodyIsNotJson)
        }
    }
}

fn write_error(res: &mut Response, e: Exception) {
    let code = e.status_code();
    res.set_code(code)
        .set_json(&json!({ "error": e.to_string(), "status": code }));
}

fn not_found(res: &mut Response, id: &str) {
    res.set_code(404)
        .set_json(&json!({ "error": format!("Item {} not found", id), "status": 404 }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        router::Dispatch,
        store::{Item, MockItemStore},
    };

    fn request(method: &str, url: &str, body: &str) -> Request {
        let raw = format!(
            "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{}",
            method,
            url,
            body.len(),
            body
        );
        Request::try_from(raw.as_bytes(), 0).unwrap()
    }

    fn item(id: &str, title: &str) -> Item {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!(title));
        Item {
            id: id.to_string(),
            fields,
        }
    }

    fn call(store: MockItemStore, req: Request) -> (Response, Value) {
        let mut router = Router::new();
        register_routes(&mut router, Arc::new(store)).unwrap();
        let mut response = Response::new();
        assert_eq!(router.dispatch(&req, &mut response, 0), Dispatch::Handled);
        let body = match response.content() {
            Some(c) => serde_json::from_slice(c).unwrap(),
            None => Value::Null,
        };
        (response, body)
    }

    #[test]
    fn test_registers_six_routes() {
        let mut router = Router::new();
        register_routes(&mut router, Arc::new(MockItemStore::new())).unwrap();
        assert_eq!(router.len(), 6);
    }

    #[test]
    fn test_list_passes_valued_query_params_as_filter() {
        let mut store = MockItemStore::new();
        store
            .expect_select()
            .withf(|filter| filter.len() == 1 && filter.get("title").map(String::as_str) == Some("milk"))
            .times(1)
            .returning(|_| vec![item("a", "milk")]);

        let (response, body) = call(store, request("GET", "/items?title=milk&flag", ""));
        assert_eq!(response.status_code(), 200);
        assert_eq!(body, json!([{"id": "a", "title": "milk"}]));
    }

    #[test]
    fn test_show_found_and_missing() {
        let mut store = MockItemStore::new();
        store
            .expect_select_one()
            .withf(|id| id == "abc")
            .returning(|_| Some(item("abc", "x")));
        let (response, body) = call(store, request("GET", "/items/abc", ""));
        assert_eq!(response.status_code(), 200);
        assert_eq!(body["id"], "abc");

        let mut store = MockItemStore::new();
        store.expect_select_one().returning(|_| None);
        let (response, body) = call(store, request("GET", "/items/zzz", ""));
        assert_eq!(response.status_code(), 404);
        assert_eq!(body["status"], 404);
    }

    #[test]
    fn test_create() {
        let mut store = MockItemStore::new();
        store
            .expect_insert()
            .withf(|fields| fields.get("title") == Some(&json!("milk")))
            .times(1)
            .returning(|fields| Item {
                id: "new".to_string(),
                fields,
            });

        let (response, body) = call(store, request("POST", "/items", r#"{"title":"milk"}"#));
        assert_eq!(response.status_code(), 201);
        assert_eq!(body, json!({"id": "new", "title": "milk"}));
    }

    #[test]
    fn test_create_with_bad_json_never_touches_store() {
        for body in ["{not json", "[1,2]", ""] {
            let mut store = MockItemStore::new();
            store.expect_insert().never();
            let (response, json_body) = call(store, request("POST", "/items", body));
            assert_eq!(response.status_code(), 400);
            assert_eq!(json_body["error"], "Request body is not a JSON object");
        }
    }

    #[test]
    fn test_replace() {
        let mut store = MockItemStore::new();
        store
            .expect_update()
            .withf(|id, fields| id == "k1" && fields.len() == 1)
            .returning(|id, fields| {
                Some(Item {
                    id: id.to_string(),
                    fields,
                })
            });
        let (response, body) = call(store, request("PUT", "/items/k1", r#"{"title":"new"}"#));
        assert_eq!(response.status_code(), 200);
        assert_eq!(body["title"], "new");
    }

    #[test]
    fn test_merge_keeps_existing_fields() {
        let mut store = MockItemStore::new();
        store.expect_select_one().returning(|id| {
            let mut existing = item(id, "old");
            existing.fields.insert("done".to_string(), json!(false));
            Some(existing)
        });
        store
            .expect_update()
            .withf(|_, fields| fields["title"] == json!("old") && fields["done"] == json!(true))
            .returning(|id, fields| {
                Some(Item {
                    id: id.to_string(),
                    fields,
                })
            });

        let (response, body) = call(store, request("PATCH", "/items/k1", r#"{"done":true}"#));
        assert_eq!(response.status_code(), 200);
        assert_eq!(body, json!({"id": "k1", "title": "old", "done": true}));
    }

    #[test]
    fn test_merge_missing_item() {
        let mut store = MockItemStore::new();
        store.expect_select_one().returning(|_| None);
        store.expect_update().never();
        let (response, _) = call(store, request("PATCH", "/items/k1", "{}"));
        assert_eq!(response.status_code(), 404);
    }

    #[test]
    fn test_remove() {
        let mut store = MockItemStore::new();
        store.expect_delete().withf(|id| id == "k1").returning(|_| true);
        let (response, body) = call(store, request("DELETE", "/items/k1", ""));
        assert_eq!(response.status_code(), 204);
        assert_eq!(body, Value::Null);

        let mut store = MockItemStore::new();
        store.expect_delete().returning(|_| false);
        let (response, _) = call(store, request("DELETE", "/items/k1", ""));
        assert_eq!(response.status_code(), 404);
    }
}
