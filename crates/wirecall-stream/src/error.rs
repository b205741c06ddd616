use wirecall_message::MessageError;

/// Errors raised by stream sockets.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A socket primitive failed outside of connection setup.
    #[error("socket operation failed: {0}")]
    SocketApi(#[source] std::io::Error),

    /// Preparing a listening socket (bind, listen, non-blocking toggle)
    /// failed.
    #[error("failed to prepare listening socket at {address}: {source}")]
    PassivePrepare {
        address: String,
        source: std::io::Error,
    },

    /// Preparing an outgoing connection failed, or every connect attempt
    /// was exhausted.
    #[error("failed to connect to {address}: {source}")]
    ActivePrepare {
        address: String,
        source: std::io::Error,
    },

    /// Host name lookup failed.
    #[error("failed to resolve host {host}: {source}")]
    NameToAddress {
        host: String,
        source: std::io::Error,
    },

    /// The resolved record set contains no IPv4 endpoint.
    #[error("host {host} did not resolve to an IPv4 address")]
    BadHostname { host: String },

    /// An endpoint string could not be parsed.
    #[error("invalid endpoint spec: {0}")]
    InvalidEndpoint(String),

    /// The peer closed the connection before a complete frame arrived.
    #[error("peer disconnected")]
    Disconnected,

    /// A continuation predicate returned false during a blocking
    /// operation.
    #[error("stopped by user request")]
    Stopped,

    /// Frame discipline violation discovered while assembling a message.
    #[error(transparent)]
    Message(#[from] MessageError),
}

pub type Result<T> = std::result::Result<T, StreamError>;
