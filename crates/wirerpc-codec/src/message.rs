//! Message envelope.
//!
//! Every message starts with two little-endian `u32` words:
//!
//! ```text
//! word 0: version(8) | service(8) | method(8) | type(8)   (version in the top byte)
//! word 1: sequence
//! ```

use std::fmt;

use crate::error::{CodecError, Result};

/// Version written into, and required from, every envelope.
pub const CODEC_VERSION: u8 = 1;

/// Envelope size on the wire.
pub const HEADER_LEN: usize = 8;

/// Kind of message carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Invocation = 0,
    OneWay = 1,
    Reply = 2,
    Notification = 3,
}

impl MessageType {
    /// Whether the peer expects no reply for this message.
    pub fn is_oneway(self) -> bool {
        matches!(self, MessageType::OneWay)
    }
}

impl TryFrom<u8> for MessageType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MessageType::Invocation),
            1 => Ok(MessageType::OneWay),
            2 => Ok(MessageType::Reply),
            3 => Ok(MessageType::Notification),
            other => Err(CodecError::InvalidMessageType(other)),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        value as u8
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::Invocation => "invocation",
            MessageType::OneWay => "oneway",
            MessageType::Reply => "reply",
            MessageType::Notification => "notification",
        };
        f.write_str(name)
    }
}

/// Decoded message envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHeader {
    pub message_type: MessageType,
    pub service_id: u8,
    pub method_id: u8,
    pub sequence: u32,
}

impl MessageHeader {
    pub fn new(message_type: MessageType, service_id: u8, method_id: u8, sequence: u32) -> Self {
        Self {
            message_type,
            service_id,
            method_id,
            sequence,
        }
    }

    /// Pack version, service, method and type into the first envelope word.
    pub fn pack(&self) -> u32 {
        (u32::from(CODEC_VERSION) << 24)
            | (u32::from(self.service_id) << 16)
            | (u32::from(self.method_id) << 8)
            | u32::from(u8::from(self.message_type))
    }

    /// Inverse of [`MessageHeader::pack`], checking the version byte.
    pub fn unpack(word: u32, sequence: u32) -> Result<Self> {
        let version = (word >> 24) as u8;
        if version != CODEC_VERSION {
            return Err(CodecError::UnsupportedVersion {
                found: version,
                expected: CODEC_VERSION,
            });
        }
        Ok(Self {
            message_type: MessageType::try_from((word & 0xFF) as u8)?,
            service_id: ((word >> 16) & 0xFF) as u8,
            method_id: ((word >> 8) & 0xFF) as u8,
            sequence,
        })
    }
}

impl fmt::Display for MessageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} service={} method={} seq={}",
            self.message_type, self.service_id, self.method_id, self.sequence
        )
    }
}
