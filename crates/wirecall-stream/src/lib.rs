//! Predicate-driven stream sockets carrying wirecall messages.
//!
//! Every blocking primitive here — accept, read, write, shutdown wait —
//! polls a caller-supplied continuation predicate while it waits. The
//! predicate returning `false` ends the wait without tearing down any
//! state the caller still owns, so user code keeps control over shutdown
//! at all times. There is no other cancellation mechanism.
//!
//! Two transports are provided: unix-domain sockets (with filesystem path
//! lifecycle) and TCP over IPv4. Both surface the same [`PointToPoint`]
//! stream type.

pub mod endpoint;
pub mod error;
pub mod server;
pub mod stream;

pub use endpoint::{Endpoint, CONNECT_RETRY_DELAY, MAX_CONNECT_ATTEMPTS};
pub use error::{Result, StreamError};
pub use server::{ServerSocket, TcpServer, UnixServer};
pub use stream::PointToPoint;
