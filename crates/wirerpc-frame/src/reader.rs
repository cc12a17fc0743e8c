use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::{trace, warn};
use wirerpc_codec::Crc16;

use crate::codec::{Frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Reads exactly the header, then exactly the body: nothing past the end of
/// the current frame is ever pulled from the stream.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
    crc: Crc16,
}

impl<T: Read> FrameReader<T> {
    /// Reader for guarded frames with the default checksum start.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            crc: config.crc(),
            config,
        }
    }

    /// Block until one whole frame has been read and verified.
    ///
    /// EOF at any point, even between frames, is
    /// [`FrameError::ConnectionClosed`].
    pub fn read_frame(&mut self) -> Result<Frame> {
        let format = self.config.format;
        let raw_header = self.base_receive(format.header_len())?;
        let header = format.decode_header(&self.crc, &raw_header).inspect_err(|err| {
            warn!(error = %err, "dropping frame with bad header");
        })?;

        let length = usize::from(header.length);
        if length > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: length,
                max: self.config.max_payload_size,
            });
        }

        let body = self.base_receive(length)?;
        format
            .verify_body(&self.crc, &header, &body)
            .inspect_err(|err| warn!(error = %err, length, "dropping frame with bad body"))?;

        trace!(%format, length, "frame received");
        Ok(Frame {
            format,
            header,
            body,
        })
    }

    /// Read the next frame and return only its body.
    pub fn receive(&mut self) -> Result<Bytes> {
        Ok(self.read_frame()?.body)
    }

    /// Block until exactly `n` bytes have arrived.
    fn base_receive(&mut self, n: usize) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(n);
        let mut filled = 0;
        while filled < n {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(buf.freeze())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Direct access to the stream. Reading from it desynchronizes framing.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the reader, returning the stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Framing configuration in effect.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
