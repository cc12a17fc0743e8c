use wirerpc_codec::{CodecError, MessageType};
use wirerpc_frame::FrameError;
use wirerpc_transport::TransportError;

/// Errors that can occur in RPC operations.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Byte channel setup or release failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Framing failed: I/O, checksum or size.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// A message could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The request/reply exchange itself was invalid.
    #[error("request error: {0}")]
    Request(#[from] RequestError),
}

impl RpcError {
    /// Whether the error is confined to one message exchange.
    ///
    /// Channel and framing errors are not: the stream can no longer be
    /// trusted after them.
    pub fn is_request_error(&self) -> bool {
        matches!(self, RpcError::Request(_) | RpcError::Codec(_))
    }

    /// Whether the peer closed the channel.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, RpcError::Frame(FrameError::ConnectionClosed))
    }
}

/// Failures of a single request/reply exchange.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The server received something other than an invocation.
    #[error("invalid type of incoming request ({0})")]
    InvalidRequestType(MessageType),

    /// The client received something other than a reply.
    #[error("invalid reply message type ({0})")]
    InvalidReplyType(MessageType),

    /// The reply answers a different request.
    #[error("unexpected sequence number in reply (was {actual}, expected {expected})")]
    UnexpectedSequence { expected: u32, actual: u32 },

    #[error("invalid service ID ({0})")]
    UnknownService(u8),

    #[error("invalid method ID ({method}) for service {service}")]
    UnknownMethod { service: u8, method: u8 },

    #[error("service ID {0} is already registered")]
    DuplicateService(u8),

    /// A handler failed. Wraps whatever the handler returned.
    #[error("method {method} of service {service} failed: {source}")]
    MethodFailed {
        service: u8,
        method: u8,
        #[source]
        source: Box<RpcError>,
    },
}

pub type Result<T> = std::result::Result<T, RpcError>;
