/// MCP Gateway
///
/// Exposes every entity operation as a callable tool and a set of read-only
/// resources over the Model Context Protocol. The gateway validates
/// arguments with the same validation module as the REST layer, then
/// forwards the call as an HTTP request, threading the request identifier
/// and, for mutations, the idempotency key.
pub mod client;
pub mod config;
pub mod resources;
pub mod server;
pub mod tools;
pub mod types;

pub use client::{ApiClient, GatewayError, RequestMeta};
pub use config::GatewayConfig;
pub use server::GatewayServer;
