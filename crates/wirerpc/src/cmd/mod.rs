use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use wirerpc::frame::FrameFormat;
use wirerpc::transport::{RpcStream, TcpChannel};
#[cfg(unix)]
use wirerpc::transport::UnixChannel;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod call;
pub mod decode;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the `arith` demo service over TCP.
    Serve(ServeArgs),
    /// Call one `arith` method and print the result.
    Call(CallArgs),
    /// Decode one hex-encoded frame and its message envelope.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Settings shared by every subcommand.
#[derive(Clone, Copy, Debug)]
pub struct Globals {
    pub format: OutputFormat,
    pub frame_format: FrameFormat,
}

pub fn run(command: Command, globals: Globals) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, globals),
        Command::Call(args) => call::run(args, globals),
        Command::Decode(args) => decode::run(args, globals),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum FrameFormatArg {
    /// 4-byte header: length and body CRC.
    Basic,
    /// 6-byte header: adds a header CRC.
    Guarded,
}

impl From<FrameFormatArg> for FrameFormat {
    fn from(arg: FrameFormatArg) -> Self {
        match arg {
            FrameFormatArg::Basic => FrameFormat::Basic,
            FrameFormatArg::Guarded => FrameFormat::Guarded,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ArithMethod {
    Double,
    Echo,
    Log,
}

impl ArithMethod {
    pub fn name(self) -> &'static str {
        match self {
            ArithMethod::Double => "double",
            ArithMethod::Echo => "echo",
            ArithMethod::Log => "log",
        }
    }
}

/// A TCP `host:port`, or `unix:PATH` for a Unix domain socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(String),
    Unix(PathBuf),
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.strip_prefix("unix:") {
            Some("") => Err("unix endpoint needs a socket path".to_string()),
            Some(path) => Ok(Endpoint::Unix(PathBuf::from(path))),
            None if input.is_empty() => Err("endpoint must not be empty".to_string()),
            None => Ok(Endpoint::Tcp(input.to_string())),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Tcp(addr) => f.write_str(addr),
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

impl Endpoint {
    pub fn connect(&self) -> wirerpc::transport::Result<RpcStream> {
        match self {
            Endpoint::Tcp(addr) => TcpChannel::connect(addr.as_str()),
            #[cfg(unix)]
            Endpoint::Unix(path) => UnixChannel::connect(path),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(wirerpc::transport::TransportError::Io(
                std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "unix sockets are not available on this platform",
                ),
            )),
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Endpoint to listen on (TCP port 0 picks a free port).
    #[arg(default_value = "127.0.0.1:5400")]
    pub addr: Endpoint,
    /// Serve a single connection, then exit.
    #[arg(long)]
    pub once: bool,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Server endpoint.
    pub addr: Endpoint,
    /// Method to invoke.
    #[arg(long, short = 'm')]
    pub method: ArithMethod,
    /// Argument: an int32 for `double`, text otherwise.
    #[arg(long, short = 'v', allow_hyphen_values = true)]
    pub value: String,
    /// Maximum time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex; spaces and `0x` prefixes are ignored.
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
