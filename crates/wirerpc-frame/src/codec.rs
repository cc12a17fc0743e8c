use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use wirerpc_codec::{Crc16, DEFAULT_CRC_START};

use crate::error::{FrameError, Result};
use crate::format::{FrameFormat, FrameHeader};

/// Largest body a 16-bit length field can describe.
pub const DEFAULT_MAX_PAYLOAD: usize = u16::MAX as usize;

/// A received frame: its decoded header and the verified body.
#[derive(Debug, Clone)]
pub struct Frame {
    pub format: FrameFormat,
    pub header: FrameHeader,
    pub body: Bytes,
}

impl Frame {
    /// The total wire size of this frame (header + body).
    pub fn wire_size(&self) -> usize {
        self.format.header_len() + self.body.len()
    }
}

/// Encode `payload` as one frame and append it to `dst`.
///
/// Wire format (guarded):
/// ```text
/// ┌──────────────┬──────────────┬──────────────┬──────────────────┐
/// │ header CRC   │ length       │ body CRC     │ body             │
/// │ (2B LE)      │ (2B LE)      │ (2B LE)      │ (length bytes)   │
/// └──────────────┴──────────────┴──────────────┴──────────────────┘
/// ```
/// The basic format drops the leading header CRC.
pub fn encode_frame(
    format: FrameFormat,
    crc: &Crc16,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let length = u16::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: DEFAULT_MAX_PAYLOAD,
    })?;
    dst.reserve(format.header_len() + payload.len());
    format.encode_header(crc, length, crc.compute(payload), dst)?;
    dst.extend_from_slice(payload);
    Ok(())
}

/// Decode one frame from the front of `src`.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// The guarded header is verified as soon as its 6 bytes are present, so a
/// corrupted length is rejected before waiting for the body. On success the
/// frame bytes are consumed from the buffer.
pub fn decode_frame(
    format: FrameFormat,
    crc: &Crc16,
    src: &mut BytesMut,
    max_payload: usize,
) -> Result<Option<Frame>> {
    let header_len = format.header_len();
    if src.len() < header_len {
        return Ok(None);
    }

    let header = format.decode_header(crc, &src[..header_len])?;
    let length = usize::from(header.length);
    if length > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: length,
            max: max_payload,
        });
    }

    if src.len() < header_len + length {
        return Ok(None);
    }

    src.advance(header_len);
    let body = src.split_to(length).freeze();
    format.verify_body(crc, &header, &body)?;

    Ok(Some(Frame {
        format,
        header,
        body,
    }))
}

/// Configuration for framed transports.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Header layout. Default: guarded (6-byte header).
    pub format: FrameFormat,
    /// CRC start value. Default: `0xEF4A`.
    pub crc_start: u16,
    /// Maximum body size in bytes. Default and ceiling: 65535.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl FrameConfig {
    /// Config for `format` with every other field at its default.
    pub fn with_format(format: FrameFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// The checksum engine for this config.
    pub fn crc(&self) -> Crc16 {
        Crc16::with_start(self.crc_start)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            format: FrameFormat::Guarded,
            crc_start: DEFAULT_CRC_START,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
