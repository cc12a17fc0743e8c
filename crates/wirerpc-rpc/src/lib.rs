//! Request/reply correlation and dispatch for wirerpc.
//!
//! The caller side is a [`ClientManager`]: it hands out [`RequestContext`]s
//! with fresh sequence numbers and checks that each reply matches the
//! request it answers. The callee side is a [`Server`] holding a registry of
//! [`Service`]s, each mapping method ids to handlers. [`SimpleServer`] pulls
//! messages off a transport one at a time and feeds them to the server.

pub mod client;
pub mod error;
pub mod server;
pub mod service;
pub mod simple_server;

pub use client::{ClientManager, RequestContext};
pub use error::{RequestError, Result, RpcError};
pub use server::Server;
pub use service::{start_reply, MethodHandler, Service};
pub use simple_server::{ServerConfig, SimpleServer, StopHandle};
