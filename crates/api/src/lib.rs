//! HTTP API: routing, request/response mapping and service wiring for `/users`.

pub mod app;
pub mod context;
pub mod middleware;
