use crate::range::UnsignedKind;

/// Errors raised while encoding or decoding a message.
///
/// A codec error is fatal to the message being processed: the buffer must
/// not be read further as if it were valid.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The envelope carries a codec version this implementation does not speak.
    #[error("unsupported codec version {found} (expected {expected})")]
    UnsupportedVersion { found: u8, expected: u8 },

    /// The envelope carries a message type outside the known set.
    #[error("invalid message type {0}")]
    InvalidMessageType(u8),

    /// An unsigned value does not fit the declared wire width.
    #[error("invalid argument: {kind} value {value} outside 0..={max}", max = kind.max())]
    ValueOutOfRange { kind: UnsignedKind, value: i64 },

    /// The operation has no wire representation in this codec.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A length prefix does not fit in 32 bits.
    #[error("length {0} does not fit a 32-bit prefix")]
    LengthOverflow(usize),

    /// A read ran past the end of the buffer.
    #[error("buffer underflow: need {needed} bytes, {remaining} remaining")]
    BufferUnderflow { needed: usize, remaining: usize },

    /// A string field is not valid UTF-8.
    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
