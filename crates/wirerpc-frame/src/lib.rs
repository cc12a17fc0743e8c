//! CRC-16 protected message framing for wirerpc.
//!
//! A frame is a small header followed by the message body. Two header
//! layouts exist, chosen per deployment and never negotiated:
//! - [`FrameFormat::Basic`]: `length:u16, body_crc:u16` (4 bytes)
//! - [`FrameFormat::Guarded`]: `header_crc:u16, length:u16, body_crc:u16`
//!   (6 bytes), where the header CRC lets a receiver reject a corrupted
//!   length before trusting it
//!
//! All header fields are little-endian and written through the codec.
//! [`FramedTransport`] runs either format over any
//! [`ByteChannel`](wirerpc_transport::ByteChannel) with independent send and
//! receive locks.

pub mod codec;
pub mod error;
pub mod format;
pub mod reader;
pub mod transport;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::RpcFrameCodec;
pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD};
pub use error::{FrameError, Result};
pub use format::{header_crc, FrameFormat, FrameHeader};
pub use reader::FrameReader;
pub use transport::{FramedTransport, Transport};
pub use writer::FrameWriter;
