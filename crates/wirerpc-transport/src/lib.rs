//! Blocking byte channels for wirerpc.
//!
//! The protocol stack only needs two things from a channel: send raw bytes,
//! and block until exactly N bytes have been read. Any `Read + Write` stream
//! provides that. This crate adds the [`ByteChannel`] trait (cloneable handles
//! so reads and writes can be locked separately, idempotent close) and ships
//! adapters for:
//! - TCP sockets
//! - Unix domain sockets (Linux/macOS)
//! - an in-process memory pipe, for tests and same-process wiring
//!
//! This is the lowest layer of wirerpc. Everything else builds on top of it.

pub mod error;
pub mod memory;
pub mod tcp;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use memory::{memory_pair, MemoryStream};
pub use tcp::TcpChannel;
pub use traits::{ByteChannel, RpcStream};

#[cfg(unix)]
pub use uds::UnixChannel;
