use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};
use wirerpc::demo::arith_server;
use wirerpc::frame::FrameConfig;
use wirerpc::rpc::{Server, ServerConfig, SimpleServer};
use wirerpc::transport::{RpcStream, TcpChannel};
#[cfg(unix)]
use wirerpc::transport::UnixChannel;

use crate::cmd::{Endpoint, Globals, ServeArgs};
use crate::exit::{rpc_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_listening, ListeningOutput};

enum Listener {
    Tcp(TcpChannel),
    #[cfg(unix)]
    Unix(UnixChannel),
}

impl Listener {
    fn bind(endpoint: &Endpoint) -> wirerpc::transport::Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => TcpChannel::bind(addr.as_str()).map(Listener::Tcp),
            #[cfg(unix)]
            Endpoint::Unix(path) => UnixChannel::bind(path).map(Listener::Unix),
            #[cfg(not(unix))]
            Endpoint::Unix(path) => Err(wirerpc::transport::TransportError::Bind {
                addr: path.display().to_string(),
                source: std::io::Error::from(std::io::ErrorKind::Unsupported),
            }),
        }
    }

    fn accept(&self) -> wirerpc::transport::Result<RpcStream> {
        match self {
            Listener::Tcp(listener) => listener.accept(),
            #[cfg(unix)]
            Listener::Unix(listener) => listener.accept(),
        }
    }

    /// The bound endpoint, with the real port for TCP port 0 binds.
    fn endpoint(&self) -> Endpoint {
        match self {
            Listener::Tcp(listener) => Endpoint::Tcp(listener.local_addr().to_string()),
            #[cfg(unix)]
            Listener::Unix(listener) => Endpoint::Unix(listener.path().to_path_buf()),
        }
    }

    /// An endpoint a local connect can reach, used to unblock `accept`.
    fn wake_endpoint(&self) -> Endpoint {
        match self {
            Listener::Tcp(listener) => Endpoint::Tcp(wake_addr(listener.local_addr()).to_string()),
            #[cfg(unix)]
            Listener::Unix(listener) => Endpoint::Unix(listener.path().to_path_buf()),
        }
    }
}

pub fn run(args: ServeArgs, globals: Globals) -> CliResult<i32> {
    let listener = Listener::bind(&args.addr).map_err(|err| transport_error("bind failed", err))?;
    let server =
        Arc::new(arith_server().map_err(|err| rpc_error("service setup failed", err))?);
    let config = ServerConfig {
        frame: FrameConfig::with_format(globals.frame_format),
        ..ServerConfig::default()
    };

    print_listening(
        &ListeningOutput {
            event: "listening",
            address: listener.endpoint().to_string(),
            frame_format: globals.frame_format.name(),
        },
        globals.format,
    );

    if args.once {
        let stream = accept(&listener)?;
        serve_connection(server, stream, config)?;
        return Ok(SUCCESS);
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), listener.wake_endpoint())?;

    while running.load(Ordering::SeqCst) {
        let stream = accept(&listener)?;
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let server = Arc::clone(&server);
        let config = config.clone();
        thread::spawn(move || {
            let peer = stream.peer_description();
            if let Err(err) = serve_connection(server, stream, config) {
                warn!(%peer, error = %err, "connection ended with error");
            }
        });
    }

    info!("shutting down");
    Ok(SUCCESS)
}

fn accept(listener: &Listener) -> CliResult<RpcStream> {
    listener
        .accept()
        .map_err(|err| transport_error("accept failed", err))
}

fn serve_connection(server: Arc<Server>, stream: RpcStream, config: ServerConfig) -> CliResult<()> {
    let peer = stream.peer_description();
    let simple = SimpleServer::from_stream(server, stream, config)
        .map_err(|err| rpc_error("connection setup failed", err))?;

    info!(%peer, "client connected");
    simple
        .run()
        .map_err(|err| rpc_error("serving failed", err))?;
    info!(%peer, "client disconnected");
    Ok(())
}

/// Clears `running` on Ctrl-C and connects to `wake` so a blocked accept
/// returns.
fn install_ctrlc_handler(running: Arc<AtomicBool>, wake: Endpoint) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        let _ = wake.connect();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn wake_addr(mut addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        let loopback = match addr {
            SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
        };
        addr.set_ip(loopback);
    }
    addr
}
