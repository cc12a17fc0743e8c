use std::io::{ErrorKind, Read, Write};
use std::net::Shutdown;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::Result;

/// A blocking, bidirectional byte channel.
///
/// Reads and writes go through `Read`/`Write`. Framing on top of a channel
/// keeps its read side and write side behind separate locks, so a channel
/// must be able to hand out a second handle to itself with [`try_clone`].
///
/// [`try_clone`]: ByteChannel::try_clone
pub trait ByteChannel: Read + Write + Send + Sized {
    /// Create a second handle to the same underlying channel.
    fn try_clone(&self) -> Result<Self>;

    /// Release the channel. Idempotent: closing twice is not an error.
    ///
    /// Any handle blocked in a read on the same channel is woken up and
    /// sees an error or EOF.
    fn close(&self) -> Result<()>;

    /// Whether [`close`](ByteChannel::close) has been called on any handle.
    fn is_closed(&self) -> bool;
}

/// A connected socket stream: implements `Read + Write`.
///
/// Wraps either a TCP stream or, on Unix, a Unix domain socket stream.
/// Clones made with [`ByteChannel::try_clone`] share the closed flag, so
/// closing any handle closes them all.
pub struct RpcStream {
    inner: RpcStreamInner,
    closed: Arc<AtomicBool>,
}

enum RpcStreamInner {
    Tcp(std::net::TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for RpcStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            RpcStreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for RpcStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            RpcStreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            RpcStreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl RpcStream {
    pub(crate) fn from_tcp(stream: std::net::TcpStream) -> Self {
        Self {
            inner: RpcStreamInner::Tcp(stream),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: RpcStreamInner::Unix(stream),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a connected pair of Unix domain socket streams.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            RpcStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            RpcStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Human-readable description of the remote end, for logs.
    pub fn peer_description(&self) -> String {
        match &self.inner {
            RpcStreamInner::Tcp(stream) => stream
                .peer_addr()
                .map(|addr| format!("tcp://{addr}"))
                .unwrap_or_else(|_| "tcp://<unknown>".to_string()),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => match stream.peer_addr() {
                Ok(addr) => match addr.as_pathname() {
                    Some(path) => format!("unix://{}", path.display()),
                    None => "unix://<unnamed>".to_string(),
                },
                Err(_) => "unix://<unknown>".to_string(),
            },
        }
    }

    fn shutdown(&self) -> std::io::Result<()> {
        match &self.inner {
            RpcStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl ByteChannel for RpcStream {
    fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            RpcStreamInner::Tcp(stream) => RpcStreamInner::Tcp(stream.try_clone()?),
            #[cfg(unix)]
            RpcStreamInner::Unix(stream) => RpcStreamInner::Unix(stream.try_clone()?),
        };
        Ok(Self {
            inner,
            closed: Arc::clone(&self.closed),
        })
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!(peer = %self.peer_description(), "closing stream");
        match self.shutdown() {
            Ok(()) => Ok(()),
            // The peer may already have torn the connection down.
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for RpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            RpcStreamInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            RpcStreamInner::Unix(_) => "unix",
        };
        f.debug_struct("RpcStream")
            .field("type", &kind)
            .field("closed", &self.is_closed())
            .finish()
    }
}
