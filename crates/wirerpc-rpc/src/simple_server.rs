//! Single-connection serving loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};
use wirerpc_codec::{BasicCodecFactory, CodecFactory, MessageHeader};
use wirerpc_frame::{FrameConfig, FramedTransport, Transport};
use wirerpc_transport::RpcStream;

use crate::error::Result;
use crate::server::Server;

/// Serving loop policy.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Framing used for accepted connections.
    pub frame: FrameConfig,
    /// End [`SimpleServer::run`] on the first failed request instead of
    /// logging it and moving on.
    pub stop_on_request_error: bool,
}

/// Stops a running [`SimpleServer`] from another thread.
#[derive(Clone)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
    transport: Arc<dyn Transport>,
}

impl StopHandle {
    /// Ask the loop to stop and close the transport so a blocked receive
    /// returns.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Err(err) = self.transport.close() {
            debug!(error = %err, "closing transport on stop");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Receives requests from one transport and answers them in order.
pub struct SimpleServer<T> {
    server: Arc<Server>,
    transport: Arc<T>,
    codec_factory: Arc<dyn CodecFactory>,
    config: ServerConfig,
    stop: StopHandle,
}

impl<T: Transport + 'static> SimpleServer<T> {
    pub fn new(server: Arc<Server>, transport: T) -> Self {
        Self::with_config(server, transport, ServerConfig::default())
    }

    pub fn with_config(server: Arc<Server>, transport: T, config: ServerConfig) -> Self {
        let transport = Arc::new(transport);
        let stop = StopHandle {
            stopped: Arc::new(AtomicBool::new(false)),
            transport: transport.clone(),
        };
        Self {
            server,
            transport,
            codec_factory: Arc::new(BasicCodecFactory),
            config,
            stop,
        }
    }

    /// Replace the codec used for incoming messages.
    pub fn with_codec_factory(mut self, codec_factory: Arc<dyn CodecFactory>) -> Self {
        self.codec_factory = codec_factory;
        self
    }

    /// Receive one message, dispatch it and send the reply if one is due.
    pub fn poll(&self) -> Result<MessageHeader> {
        let message = self.transport.receive()?;
        self.handle_message(&message)
    }

    fn handle_message(&self, message: &Bytes) -> Result<MessageHeader> {
        let mut codec = self.codec_factory.create_from(message);
        let header = self.server.process_request(codec.as_mut())?;
        if !codec.is_empty() {
            self.transport.send(codec.array())?;
        }
        Ok(header)
    }

    /// Serve until stopped or the peer disconnects.
    ///
    /// Failed requests are logged and skipped unless
    /// [`ServerConfig::stop_on_request_error`] is set. Channel and framing
    /// errors end the loop with the error.
    pub fn run(&self) -> Result<()> {
        while !self.stop.is_stopped() {
            match self.poll() {
                Ok(_) => {}
                Err(_) if self.stop.is_stopped() => break,
                Err(err) if err.is_disconnect() => {
                    info!("peer disconnected");
                    break;
                }
                Err(err) if err.is_request_error() && !self.config.stop_on_request_error => {
                    warn!(error = %err, "error while processing request");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Stop a [`run`](Self::run) in progress.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl SimpleServer<FramedTransport<RpcStream>> {
    /// Serve an accepted socket, framed per `config.frame`.
    pub fn from_stream(server: Arc<Server>, stream: RpcStream, config: ServerConfig) -> Result<Self> {
        let transport = FramedTransport::from_stream(stream, config.frame.clone())?;
        Ok(Self::with_config(server, transport, config))
    }
}
