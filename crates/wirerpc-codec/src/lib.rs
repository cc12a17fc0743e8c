//! Binary codec for wirerpc messages.
//!
//! Everything that turns values into bytes lives here:
//! - [`Crc16`], the table-driven CRC-16 used to protect frames
//! - [`MessageHeader`], the 8-byte envelope at the front of every message
//! - the [`Codec`] trait and its only implementation, [`BasicCodec`]
//! - [`CodecFactory`], so callers never name the codec type directly
//!
//! All multi-byte values are little-endian on the wire.

pub mod basic;
pub mod codec;
pub mod crc;
pub mod error;
pub mod factory;
pub mod message;
pub mod range;

pub use basic::{BasicCodec, DEFAULT_BUFFER_SIZE};
pub use codec::Codec;
pub use crc::{crc16, Crc16, CRC16_POLY, DEFAULT_CRC_START};
pub use error::{CodecError, Result};
pub use factory::{BasicCodecFactory, CodecFactory};
pub use message::{MessageHeader, MessageType, CODEC_VERSION, HEADER_LEN};
pub use range::UnsignedKind;
