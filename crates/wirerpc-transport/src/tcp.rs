use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::RpcStream;

/// TCP listener handing out [`RpcStream`] connections.
pub struct TcpChannel {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpChannel {
    /// Bind and listen on a TCP address. Port 0 picks a free port.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|source| TransportError::Bind {
            addr: format!("{addr:?}"),
            source,
        })?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "listening on tcp");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<RpcStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted tcp connection");
        Ok(RpcStream::from_tcp(stream))
    }

    /// Connect to a listening TCP address (blocking).
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<RpcStream> {
        let stream = TcpStream::connect(&addr).map_err(|source| TransportError::Connect {
            addr: format!("{addr:?}"),
            source,
        })?;
        stream.set_nodelay(true)?;
        debug!(?addr, "connected over tcp");
        Ok(RpcStream::from_tcp(stream))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
