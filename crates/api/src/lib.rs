//! HTTP API: TLS front door, routing, and request/response mapping.

pub mod app;
pub mod config;
pub mod context;
pub mod cookie;
pub mod middleware;
pub mod server;
