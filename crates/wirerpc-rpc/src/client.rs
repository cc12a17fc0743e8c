use std::sync::Arc;

use tracing::debug;
use wirerpc_codec::{BasicCodecFactory, Codec, CodecFactory, MessageHeader, MessageType};
use wirerpc_frame::Transport;

use crate::error::{RequestError, Result};

/// One outstanding request: its sequence number and the codec that carries
/// the request out and the reply back.
pub struct RequestContext {
    sequence: u32,
    codec: Box<dyn Codec>,
    is_oneway: bool,
}

impl RequestContext {
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn is_oneway(&self) -> bool {
        self.is_oneway
    }

    /// Write the request envelope for `service_id`/`method_id`, typed as an
    /// invocation or one-way message to match this context.
    pub fn start_invocation(&mut self, service_id: u8, method_id: u8) {
        let message_type = if self.is_oneway {
            MessageType::OneWay
        } else {
            MessageType::Invocation
        };
        self.codec.start_write_message(&MessageHeader::new(
            message_type,
            service_id,
            method_id,
            self.sequence,
        ));
    }

    /// The request codec before the call, the reply codec after it.
    pub fn codec(&mut self) -> &mut dyn Codec {
        self.codec.as_mut()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("sequence", &self.sequence)
            .field("is_oneway", &self.is_oneway)
            .field("len", &self.codec.array().len())
            .finish()
    }
}

/// Caller side of the protocol.
///
/// Strictly one request at a time: [`create_request`](Self::create_request)
/// takes `&mut self`, and a reply is only matched against the single
/// outstanding sequence number.
pub struct ClientManager<T> {
    transport: T,
    codec_factory: Arc<dyn CodecFactory>,
    sequence: u32,
}

impl<T: Transport> ClientManager<T> {
    /// Client using [`BasicCodec`](wirerpc_codec::BasicCodec).
    pub fn new(transport: T) -> Self {
        Self::with_codec_factory(transport, Arc::new(BasicCodecFactory))
    }

    pub fn with_codec_factory(transport: T, codec_factory: Arc<dyn CodecFactory>) -> Self {
        Self {
            transport,
            codec_factory,
            sequence: 0,
        }
    }

    /// Start a request with the next sequence number (the first is 1).
    pub fn create_request(&mut self, is_oneway: bool) -> RequestContext {
        self.sequence = self.sequence.wrapping_add(1);
        RequestContext {
            sequence: self.sequence,
            codec: self.codec_factory.create(),
            is_oneway,
        }
    }

    /// Send the request and, unless it is one-way, wait for its reply.
    ///
    /// On success the context's codec holds the reply, positioned just past
    /// the envelope. A reply of the wrong type or for another sequence
    /// number is an error and its contents are not exposed.
    pub fn perform_request(&self, request: &mut RequestContext) -> Result<()> {
        self.transport.send(request.codec.array())?;
        if request.is_oneway {
            debug!(sequence = request.sequence, "one-way request sent");
            return Ok(());
        }

        let reply = self.transport.receive()?;
        request.codec.set_array(&reply);
        let header = match request.codec.start_read_message() {
            Ok(header) => header,
            Err(err) => {
                request.codec.reset();
                return Err(err.into());
            }
        };

        if header.message_type != MessageType::Reply {
            request.codec.reset();
            return Err(RequestError::InvalidReplyType(header.message_type).into());
        }
        if header.sequence != request.sequence {
            request.codec.reset();
            return Err(RequestError::UnexpectedSequence {
                expected: request.sequence,
                actual: header.sequence,
            }
            .into());
        }

        debug!(
            sequence = header.sequence,
            service = header.service_id,
            method = header.method_id,
            "reply received"
        );
        Ok(())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The sequence number of the most recent request.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}
