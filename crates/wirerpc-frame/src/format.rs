//! The two frame header layouts.

use std::fmt;

use bytes::BytesMut;
use wirerpc_codec::{BasicCodec, Codec, Crc16};

use crate::error::{FrameError, Result};

/// Frame header layout, fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameFormat {
    /// `length:u16, body_crc:u16`.
    Basic,
    /// `header_crc:u16, length:u16, body_crc:u16`.
    #[default]
    Guarded,
}

impl FrameFormat {
    /// Size of the header on the wire.
    pub const fn header_len(self) -> usize {
        match self {
            FrameFormat::Basic => 4,
            FrameFormat::Guarded => 6,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FrameFormat::Basic => "basic",
            FrameFormat::Guarded => "guarded",
        }
    }

    /// Append the header for a body of `length` bytes with checksum `body_crc`.
    pub fn encode_header(
        self,
        crc: &Crc16,
        length: u16,
        body_crc: u16,
        dst: &mut BytesMut,
    ) -> Result<()> {
        let mut codec = BasicCodec::with_capacity(self.header_len());
        if self == FrameFormat::Guarded {
            codec.write_uint16(header_crc(crc, length, body_crc).into())?;
        }
        codec.write_uint16(length.into())?;
        codec.write_uint16(body_crc.into())?;
        dst.extend_from_slice(codec.array());
        Ok(())
    }

    /// Parse a header from the first [`header_len`](Self::header_len) bytes
    /// of `src`. For [`FrameFormat::Guarded`] the header checksum is verified
    /// here, before the length is handed back to the caller.
    pub fn decode_header(self, crc: &Crc16, src: &[u8]) -> Result<FrameHeader> {
        let mut codec = BasicCodec::from_slice(src);
        match self {
            FrameFormat::Basic => {
                let length = codec.read_uint16()?;
                let body_crc = codec.read_uint16()?;
                Ok(FrameHeader {
                    length,
                    body_crc,
                    header_crc: None,
                })
            }
            FrameFormat::Guarded => {
                let received = codec.read_uint16()?;
                let length = codec.read_uint16()?;
                let body_crc = codec.read_uint16()?;
                let computed = header_crc(crc, length, body_crc);
                if received != computed {
                    return Err(FrameError::HeaderCrc { received, computed });
                }
                Ok(FrameHeader {
                    length,
                    body_crc,
                    header_crc: Some(received),
                })
            }
        }
    }

    /// Check `body` against the checksum carried in its header.
    pub fn verify_body(self, crc: &Crc16, header: &FrameHeader, body: &[u8]) -> Result<()> {
        let computed = crc.compute(body);
        if computed == header.body_crc {
            return Ok(());
        }
        let received = header.body_crc;
        Err(match self {
            FrameFormat::Basic => FrameError::InvalidCrc { received, computed },
            FrameFormat::Guarded => FrameError::BodyCrc { received, computed },
        })
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded frame header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub length: u16,
    pub body_crc: u16,
    /// Present only for [`FrameFormat::Guarded`].
    pub header_crc: Option<u16>,
}

/// Checksum over the length and body-checksum fields:
/// `(crc(le16(length)) + crc(le16(body_crc))) & 0xFFFF`.
pub fn header_crc(crc: &Crc16, length: u16, body_crc: u16) -> u16 {
    crc.compute(&length.to_le_bytes())
        .wrapping_add(crc.compute(&body_crc.to_le_bytes()))
}
