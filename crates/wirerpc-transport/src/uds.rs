use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::RpcStream;

/// Unix domain socket listener handing out [`RpcStream`] connections.
///
/// Owns its socket file: a leftover socket at the path is replaced on bind,
/// and the file is unlinked on drop if it is still the one we created.
pub struct UnixChannel {
    listener: UnixListener,
    path: PathBuf,
    identity: SocketIdentity,
}

/// Device and inode of the socket file created by [`UnixChannel::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SocketIdentity {
    dev: u64,
    ino: u64,
}

impl SocketIdentity {
    fn of(metadata: &std::fs::Metadata) -> Self {
        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }
}

/// `sockaddr_un.sun_path` capacity, including the trailing NUL.
#[cfg(target_os = "linux")]
const SUN_PATH_CAPACITY: usize = 108;
#[cfg(not(target_os = "linux"))]
const SUN_PATH_CAPACITY: usize = 104;

impl UnixChannel {
    /// Mode applied to the socket file after binding.
    pub const SOCKET_MODE: u32 = 0o600;

    /// Bind and listen on `path`.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_path_len(&path)?;

        let bind_err = |source: std::io::Error| TransportError::Bind {
            addr: path.display().to_string(),
            source,
        };
        remove_stale_socket(&path).map_err(bind_err)?;

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(Self::SOCKET_MODE))
            .map_err(bind_err)?;
        let identity = std::fs::symlink_metadata(&path)
            .map(|metadata| SocketIdentity::of(&metadata))
            .map_err(bind_err)?;

        info!(?path, "listening on unix socket");
        Ok(Self {
            listener,
            path,
            identity,
        })
    }

    pub fn accept(&self) -> Result<RpcStream> {
        let (stream, _) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "accepted unix connection");
        Ok(RpcStream::from_unix(stream))
    }

    pub fn connect(path: impl AsRef<Path>) -> Result<RpcStream> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|source| TransportError::Connect {
            addr: path.display().to_string(),
            source,
        })?;
        debug!(?path, "connected over unix socket");
        Ok(RpcStream::from_unix(stream))
    }

    /// Filesystem path of the bound socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= SUN_PATH_CAPACITY {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: SUN_PATH_CAPACITY - 1,
        });
    }
    Ok(())
}

/// Unlink a socket left behind by a previous listener. Anything that is not
/// a socket is an error.
fn remove_stale_socket(path: &Path) -> std::io::Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    if !metadata.file_type().is_socket() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "path exists and is not a unix socket",
        ));
    }
    debug!(?path, "removing stale socket");
    std::fs::remove_file(path)
}

impl Drop for UnixChannel {
    fn drop(&mut self) {
        let current = std::fs::symlink_metadata(&self.path)
            .ok()
            .filter(|metadata| metadata.file_type().is_socket())
            .map(|metadata| SocketIdentity::of(&metadata));
        if current == Some(self.identity) {
            let _ = std::fs::remove_file(&self.path);
        } else {
            debug!(path = ?self.path, "socket file replaced; leaving it");
        }
    }
}
