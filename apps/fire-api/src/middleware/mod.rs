//! HTTP 中间件

mod auth;

pub use auth::*;
