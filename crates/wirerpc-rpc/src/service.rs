use std::collections::BTreeMap;
use std::fmt;

use wirerpc_codec::{Codec, MessageHeader, MessageType};

use crate::error::{RequestError, Result, RpcError};

/// Server-side handler for one method.
///
/// Called with the request's sequence number and the codec positioned just
/// past the envelope. A handler for a two-way method leaves the reply in
/// the codec, usually by calling [`start_reply`] and writing results.
pub type MethodHandler = Box<dyn Fn(u32, &mut dyn Codec) -> Result<()> + Send + Sync>;

/// A remote interface: a service id and its method handlers.
pub struct Service {
    id: u8,
    methods: BTreeMap<u8, MethodHandler>,
}

impl Service {
    /// Empty service answering to `id`.
    pub fn new(id: u8) -> Self {
        Self {
            id,
            methods: BTreeMap::new(),
        }
    }

    /// Service id carried in the message envelope.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Register `handler` for `method_id`, replacing any previous handler.
    pub fn add_method<F>(&mut self, method_id: u8, handler: F) -> &mut Self
    where
        F: Fn(u32, &mut dyn Codec) -> Result<()> + Send + Sync + 'static,
    {
        self.methods.insert(method_id, Box::new(handler));
        self
    }

    /// Builder form of [`add_method`](Self::add_method).
    pub fn with_method<F>(mut self, method_id: u8, handler: F) -> Self
    where
        F: Fn(u32, &mut dyn Codec) -> Result<()> + Send + Sync + 'static,
    {
        self.add_method(method_id, handler);
        self
    }

    /// Registered method ids, ascending.
    pub fn method_ids(&self) -> Vec<u8> {
        self.methods.keys().copied().collect()
    }

    /// Run the handler for `method_id`.
    ///
    /// Any handler failure comes back as [`RequestError::MethodFailed`].
    pub fn handle_invocation(
        &self,
        method_id: u8,
        sequence: u32,
        codec: &mut dyn Codec,
    ) -> Result<()> {
        let handler = self
            .methods
            .get(&method_id)
            .ok_or(RequestError::UnknownMethod {
                service: self.id,
                method: method_id,
            })?;

        handler(sequence, codec).map_err(|err| {
            RpcError::from(RequestError::MethodFailed {
                service: self.id,
                method: method_id,
                source: Box::new(err),
            })
        })
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("id", &self.id)
            .field("methods", &self.method_ids())
            .finish()
    }
}

/// Discard the request and write a reply envelope for it.
pub fn start_reply(codec: &mut dyn Codec, service_id: u8, method_id: u8, sequence: u32) {
    codec.reset();
    codec.start_write_message(&MessageHeader::new(
        MessageType::Reply,
        service_id,
        method_id,
        sequence,
    ));
}
