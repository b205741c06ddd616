use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, StreamError};
use crate::stream::PointToPoint;

/// Connect attempts before giving up on a refused endpoint.
pub const MAX_CONNECT_ATTEMPTS: u32 = 10;

/// Spacing between connect attempts.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Client-side address of a listening server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Filesystem path of a unix-domain socket.
    Unix(PathBuf),
    /// TCP host and port; the host may be a name or an IPv4 literal.
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    /// Connect and return a ready point-to-point stream.
    ///
    /// A unix endpoint whose path does not exist is refused immediately.
    /// Refused connections are retried up to [`MAX_CONNECT_ATTEMPTS`]
    /// times with [`CONNECT_RETRY_DELAY`] spacing, covering the window in
    /// which a server has bound its address but not yet reached accept.
    pub fn connect(&self) -> Result<PointToPoint> {
        match self {
            Endpoint::Unix(path) => {
                if !path.exists() {
                    return Err(StreamError::ActivePrepare {
                        address: path.display().to_string(),
                        source: std::io::Error::new(
                            ErrorKind::NotFound,
                            "socket path does not exist",
                        ),
                    });
                }
                let address = path.display().to_string();
                let stream = connect_with_retry(&address, || UnixStream::connect(path))?;
                PointToPoint::from_unix(stream)
            }
            Endpoint::Tcp { host, port } => {
                let addr = resolve_ipv4(host, *port)?;
                let stream = connect_with_retry(&addr.to_string(), || TcpStream::connect(addr))?;
                PointToPoint::from_tcp(stream)
            }
        }
    }
}

impl FromStr for Endpoint {
    type Err = StreamError;

    /// `tcp://host:port` selects TCP; anything else is a socket path.
    fn from_str(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix("tcp://") {
            let Some((host, port)) = rest.rsplit_once(':') else {
                return Err(StreamError::InvalidEndpoint(format!(
                    "{s}: expected tcp://host:port"
                )));
            };
            if host.is_empty() {
                return Err(StreamError::InvalidEndpoint(format!("{s}: empty host")));
            }
            let port: u16 = port
                .parse()
                .map_err(|_| StreamError::InvalidEndpoint(format!("{s}: invalid port")))?;
            return Ok(Endpoint::Tcp {
                host: host.to_string(),
                port,
            });
        }
        if s.is_empty() {
            return Err(StreamError::InvalidEndpoint("empty endpoint".to_string()));
        }
        Ok(Endpoint::Unix(PathBuf::from(s)))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
            Endpoint::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

fn resolve_ipv4(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| StreamError::NameToAddress {
            host: host.to_string(),
            source,
        })?;
    addrs
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| StreamError::BadHostname {
            host: host.to_string(),
        })
}

fn connect_with_retry<S>(
    address: &str,
    mut connect: impl FnMut() -> std::io::Result<S>,
) -> Result<S> {
    let mut attempt = 1;
    loop {
        match connect() {
            Ok(stream) => return Ok(stream),
            Err(err) if attempt < MAX_CONNECT_ATTEMPTS && is_retryable(&err) => {
                debug!(address, attempt, error = %err, "connect refused, retrying");
                attempt += 1;
                std::thread::sleep(CONNECT_RETRY_DELAY);
            }
            Err(source) => {
                return Err(StreamError::ActivePrepare {
                    address: address.to_string(),
                    source,
                })
            }
        }
    }
}

fn is_retryable(err: &std::io::Error) -> bool {
    // WouldBlock folds EAGAIN and in-progress non-blocking connects into
    // the same retry path as refusal.
    matches!(
        err.kind(),
        ErrorKind::ConnectionRefused | ErrorKind::WouldBlock
    )
}
