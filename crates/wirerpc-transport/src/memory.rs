//! In-process duplex byte pipe.
//!
//! Two [`MemoryStream`] ends behave like a connected socket pair: bytes
//! written on one end become readable on the other, reads block until data
//! arrives, and closing either end shows up as EOF on both.

use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use bytes::{Buf, BytesMut};

use crate::error::Result;
use crate::traits::ByteChannel;

#[derive(Default)]
struct PipeState {
    buf: BytesMut,
    closed: bool,
}

#[derive(Default)]
struct Pipe {
    state: Mutex<PipeState>,
    readable: Condvar,
}

impl Pipe {
    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        self.lock().closed = true;
        self.readable.notify_all();
    }
}

/// One end of an in-memory duplex pipe.
#[derive(Clone)]
pub struct MemoryStream {
    inbound: Arc<Pipe>,
    outbound: Arc<Pipe>,
}

/// Create a connected pair of in-memory streams.
pub fn memory_pair() -> (MemoryStream, MemoryStream) {
    let a_to_b = Arc::new(Pipe::default());
    let b_to_a = Arc::new(Pipe::default());

    let a = MemoryStream {
        inbound: Arc::clone(&b_to_a),
        outbound: Arc::clone(&a_to_b),
    };
    let b = MemoryStream {
        inbound: a_to_b,
        outbound: b_to_a,
    };
    (a, b)
}

impl MemoryStream {
    /// Number of bytes written by the peer and not read yet.
    pub fn pending(&self) -> usize {
        self.inbound.lock().buf.len()
    }
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut state = self.inbound.lock();
        while state.buf.is_empty() && !state.closed {
            state = self
                .inbound
                .readable
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.buf.is_empty() {
            return Ok(0);
        }
        let n = state.buf.len().min(buf.len());
        buf[..n].copy_from_slice(&state.buf[..n]);
        state.buf.advance(n);
        Ok(n)
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut state = self.outbound.lock();
        if state.closed {
            return Err(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "memory pipe closed",
            ));
        }
        state.buf.extend_from_slice(buf);
        drop(state);
        self.outbound.readable.notify_all();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl ByteChannel for MemoryStream {
    fn try_clone(&self) -> Result<Self> {
        Ok(self.clone())
    }

    fn close(&self) -> Result<()> {
        self.inbound.close();
        self.outbound.close();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inbound.lock().closed || self.outbound.lock().closed
    }
}

impl std::fmt::Debug for MemoryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStream")
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}
