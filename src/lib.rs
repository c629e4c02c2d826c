pub mod api;
pub mod config;
pub mod exception;
pub mod param;
pub mod pattern;
pub mod query;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod store;

pub use config::Config;
pub use exception::Exception;
pub use param::{HttpEncoding, HttpRequestMethod, HttpVersion};
pub use pattern::{PathMatch, PathPattern};
pub use query::QueryMap;
pub use request::Request;
pub use response::Response;
pub use router::{Dispatch, RequestContext, Router};
pub use store::{Item, ItemStore, MemoryStore};
