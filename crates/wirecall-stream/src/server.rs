use std::io::ErrorKind;
use std::net::TcpListener;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, StreamError};
use crate::stream::{PointToPoint, POLL_INTERVAL};

/// The accept seam consumed by server loops.
///
/// Implemented by both transports so a server loop can be written once
/// and bound to either.
pub trait ServerSocket {
    /// Block until a peer connects or the predicate trips.
    ///
    /// A predicate trip raises [`StreamError::Stopped`].
    fn accept<P: Fn() -> bool>(&self, pred: &P) -> Result<PointToPoint>;
}

/// Listening unix-domain socket bound to a filesystem path.
///
/// The path is the server's only filesystem artifact; it is removed again
/// when the server is dropped. A stale socket file left by a crashed
/// process is removed before binding, but an existing non-socket file is
/// refused.
#[derive(Debug)]
pub struct UnixServer {
    listener: UnixListener,
    path: PathBuf,
}

impl UnixServer {
    /// Bind and listen on `path`.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let prepare = |source: std::io::Error| StreamError::PassivePrepare {
            address: path.display().to_string(),
            source,
        };

        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(prepare)?;
            if metadata.file_type().is_socket() {
                debug!(?path, "removing stale socket");
                std::fs::remove_file(&path).map_err(prepare)?;
            } else {
                return Err(prepare(std::io::Error::new(
                    ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
        }

        let listener = UnixListener::bind(&path).map_err(prepare)?;
        listener.set_nonblocking(true).map_err(prepare)?;

        info!(?path, "listening on unix domain socket");
        Ok(Self { listener, path })
    }

    /// The path this server is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ServerSocket for UnixServer {
    fn accept<P: Fn() -> bool>(&self, pred: &P) -> Result<PointToPoint> {
        loop {
            match self.listener.accept() {
                Ok((stream, _addr)) => {
                    debug!("accepted connection");
                    return PointToPoint::from_unix(stream);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if !pred() {
                        return Err(StreamError::Stopped);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(StreamError::SocketApi(err)),
            }
        }
    }
}

impl Drop for UnixServer {
    fn drop(&mut self) {
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket() {
                debug!(path = ?self.path, "removing socket file");
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }
}

/// Listening TCP socket on an IPv4 port.
pub struct TcpServer {
    listener: TcpListener,
}

impl TcpServer {
    /// Bind and listen on `0.0.0.0:port`. Port 0 asks the OS for a free
    /// port; see [`port`](TcpServer::port).
    pub fn bind(port: u16) -> Result<Self> {
        let address = format!("0.0.0.0:{port}");
        let prepare = |source: std::io::Error| StreamError::PassivePrepare {
            address: address.clone(),
            source,
        };

        let listener = TcpListener::bind(&address).map_err(prepare)?;
        listener.set_nonblocking(true).map_err(prepare)?;

        info!(
            port = listener.local_addr().map(|a| a.port()).unwrap_or(port),
            "listening on tcp socket"
        );
        Ok(Self { listener })
    }

    /// The actual bound port.
    pub fn port(&self) -> Result<u16> {
        self.listener
            .local_addr()
            .map(|addr| addr.port())
            .map_err(StreamError::SocketApi)
    }
}

impl ServerSocket for TcpServer {
    fn accept<P: Fn() -> bool>(&self, pred: &P) -> Result<PointToPoint> {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    debug!(%addr, "accepted connection");
                    return PointToPoint::from_tcp(stream);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if !pred() {
                        return Err(StreamError::Stopped);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(StreamError::SocketApi(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::thread;

    use wirecall_message::{InMessage, OutMessage};

    use super::*;
    use crate::endpoint::Endpoint;

    fn make_sock_path(tag: &str) -> PathBuf {
        let dir = PathBuf::from(format!(
            "/tmp/wirecall-{}-{}-{}",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir.join("server.sock")
    }

    fn always() -> bool {
        true
    }

    #[test]
    fn bind_accept_exchange() {
        let sock_path = make_sock_path("exchange");
        let server = UnixServer::bind(&sock_path).expect("server should bind");
        assert!(sock_path.exists());

        let path_clone = sock_path.clone();
        let client = thread::spawn(move || {
            let mut stream = Endpoint::Unix(path_clone)
                .connect()
                .expect("client should connect");
            let mut out = OutMessage::new();
            out.write_str("hello").unwrap();
            assert!(stream.write_message(&out, &always).unwrap());
        });

        let mut conn = server.accept(&always).expect("accept should succeed");
        let mut input = InMessage::new();
        assert!(conn.read_message(&mut input, &always).unwrap());
        assert_eq!(input.read_str().unwrap(), "hello");

        client.join().expect("client thread should finish");

        drop(server);
        assert!(!sock_path.exists(), "socket path should be removed on drop");
        if let Some(parent) = sock_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn accept_predicate_trip_is_stopped() {
        let sock_path = make_sock_path("stop");
        let server = UnixServer::bind(&sock_path).expect("server should bind");

        let err = server.accept(&|| false).unwrap_err();
        assert!(matches!(err, StreamError::Stopped));

        drop(server);
        assert!(!sock_path.exists());
        if let Some(parent) = sock_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn stale_socket_is_replaced() {
        let sock_path = make_sock_path("stale");
        let first = UnixServer::bind(&sock_path).expect("first bind should succeed");
        // Simulate a crash: forget the server so its Drop never runs.
        std::mem::forget(first);
        assert!(sock_path.exists());

        let second = UnixServer::bind(&sock_path).expect("rebinding over a stale socket");
        drop(second);
        if let Some(parent) = sock_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn existing_regular_file_is_refused() {
        let sock_path = make_sock_path("file");
        std::fs::write(&sock_path, b"not a socket").unwrap();

        let err = UnixServer::bind(&sock_path).unwrap_err();
        assert!(matches!(err, StreamError::PassivePrepare { .. }));

        assert!(sock_path.exists(), "regular file must survive the refusal");
        if let Some(parent) = sock_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn tcp_bind_accept_exchange() {
        let server = TcpServer::bind(0).expect("tcp server should bind");
        let port = server.port().expect("bound port should be readable");

        let client = thread::spawn(move || {
            let mut stream = Endpoint::Tcp {
                host: "127.0.0.1".to_string(),
                port,
            }
            .connect()
            .expect("client should connect");
            let mut out = OutMessage::new();
            out.write_u32(4242).unwrap();
            assert!(stream.write_message(&out, &always).unwrap());
        });

        let mut conn = server.accept(&always).expect("accept should succeed");
        let mut input = InMessage::new();
        assert!(conn.read_message(&mut input, &always).unwrap());
        assert_eq!(input.read_u32().unwrap(), 4242);

        client.join().expect("client thread should finish");
    }
}
