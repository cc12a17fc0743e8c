//! Framed transport over a byte channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::debug;
use wirerpc_transport::{ByteChannel, RpcStream};

use crate::codec::FrameConfig;
use crate::error::Result;
use crate::format::FrameFormat;
use crate::reader::FrameReader;
use crate::writer::FrameWriter;

/// A message-oriented transport: whole messages in, whole messages out.
pub trait Transport: Send + Sync {
    /// Send one message as one frame.
    fn send(&self, message: &[u8]) -> Result<()>;

    /// Block until one complete, verified message has arrived.
    fn receive(&self) -> Result<Bytes>;

    /// Release the underlying channel. Blocked receivers are woken.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, message: &[u8]) -> Result<()> {
        (**self).send(message)
    }

    fn receive(&self) -> Result<Bytes> {
        (**self).receive()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

/// Frames messages over a [`ByteChannel`].
///
/// Sending and receiving each hold their own lock, so one send and one
/// receive may run at the same time while two sends (or two receives)
/// never interleave their bytes on the wire.
pub struct FramedTransport<C: ByteChannel> {
    reader: Mutex<FrameReader<C>>,
    writer: Mutex<FrameWriter<C>>,
    channel: C,
    config: FrameConfig,
}

impl<C: ByteChannel> FramedTransport<C> {
    /// Frame `channel` with the default configuration (guarded format).
    pub fn new(channel: C) -> Result<Self> {
        Self::with_config(channel, FrameConfig::default())
    }

    /// Frame `channel` with explicit configuration.
    pub fn with_config(channel: C, config: FrameConfig) -> Result<Self> {
        let reader = FrameReader::with_config(channel.try_clone()?, config.clone());
        let writer = FrameWriter::with_config(channel.try_clone()?, config.clone());
        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            channel,
            config,
        })
    }

    pub fn format(&self) -> FrameFormat {
        self.config.format
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// The channel this transport was built on.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    fn reader(&self) -> MutexGuard<'_, FrameReader<C>> {
        self.reader.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn writer(&self) -> MutexGuard<'_, FrameWriter<C>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FramedTransport<RpcStream> {
    /// Frame a socket stream, applying the read and write timeouts from
    /// `config` to the socket first.
    pub fn from_stream(stream: RpcStream, config: FrameConfig) -> Result<Self> {
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        debug!(
            peer = %stream.peer_description(),
            format = %config.format,
            "framing stream"
        );
        Self::with_config(stream, config)
    }
}

impl<C: ByteChannel + Sync> Transport for FramedTransport<C> {
    fn send(&self, message: &[u8]) -> Result<()> {
        self.writer().send(message)
    }

    fn receive(&self) -> Result<Bytes> {
        self.reader().receive()
    }

    fn close(&self) -> Result<()> {
        self.channel.close()?;
        Ok(())
    }
}

impl<C: ByteChannel> std::fmt::Debug for FramedTransport<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramedTransport")
            .field("format", &self.config.format)
            .field("closed", &self.channel.is_closed())
            .finish()
    }
}
