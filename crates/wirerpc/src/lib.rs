//! Lightweight binary RPC over framed byte channels.
//!
//! wirerpc moves small, fixed-layout binary messages between a client and a
//! server over anything that can carry bytes: TCP, Unix sockets, a serial
//! line, an in-process pipe. Every frame is protected by a CRC-16.
//!
//! # Crate Structure
//!
//! - [`transport`]: blocking byte channels (TCP, UDS, memory pipe)
//! - [`codec`]: CRC-16 engine, message envelope, `BasicCodec`
//! - [`frame`]: 4-byte and 6-byte frame headers and the framed transport
//! - [`rpc`]: client manager, services, server dispatch and serving loop
//! - [`demo`]: the `arith` example service used by the CLI

/// Re-export transport types.
pub mod transport {
    pub use wirerpc_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use wirerpc_codec::*;
}

/// Re-export frame types.
pub mod frame {
    pub use wirerpc_frame::*;
}

/// Re-export RPC types.
pub mod rpc {
    pub use wirerpc_rpc::*;
}

pub mod demo;
