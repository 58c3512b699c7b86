//! HTTP API: routing, request/response mapping and the server entrypoint.

pub mod app;
pub mod middleware;
