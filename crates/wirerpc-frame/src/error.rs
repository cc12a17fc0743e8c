use wirerpc_codec::CodecError;
use wirerpc_transport::TransportError;

/// Errors that can occur while sending or receiving frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Body checksum mismatch on a 4-byte-header frame.
    #[error("invalid message CRC (received {received:#06x}, computed {computed:#06x})")]
    InvalidCrc { received: u16, computed: u16 },

    /// Header checksum mismatch on a 6-byte-header frame. The length field
    /// cannot be trusted, so the body was not read.
    #[error("invalid message (header) CRC (received {received:#06x}, computed {computed:#06x})")]
    HeaderCrc { received: u16, computed: u16 },

    /// Body checksum mismatch on a 6-byte-header frame.
    #[error("invalid message (body) CRC (received {received:#06x}, computed {computed:#06x})")]
    BodyCrc { received: u16, computed: u16 },

    /// The body exceeds the configured or representable maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred on the byte channel.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the channel before a complete frame arrived.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// A header field could not be encoded or decoded.
    #[error("frame header: {0}")]
    Codec(#[from] CodecError),

    /// The byte channel could not be set up or released.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// Whether this is one of the checksum failures.
    pub fn is_crc_error(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidCrc { .. } | FrameError::HeaderCrc { .. } | FrameError::BodyCrc { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
