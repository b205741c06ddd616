use std::fmt;
use std::io;

use wirecall_message::MessageError;
use wirecall_rpc::RpcError;
use wirecall_stream::StreamError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;
/// Interrupted by user request (128 + SIGINT).
pub const STOPPED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied
        | io::ErrorKind::NotFound
        | io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn message_error(context: &str, err: MessageError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn stream_error(context: &str, err: StreamError) -> CliError {
    match err {
        StreamError::Stopped => CliError::new(STOPPED, format!("{context}: {err}")),
        StreamError::SocketApi(source) => io_error(context, source),
        StreamError::PassivePrepare { source, .. } | StreamError::ActivePrepare { source, .. } => {
            io_error(context, source)
        }
        StreamError::InvalidEndpoint(_) => CliError::new(USAGE, format!("{context}: {err}")),
        StreamError::Message(err) => message_error(context, err),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn rpc_error(context: &str, err: RpcError) -> CliError {
    match err {
        RpcError::Stream(err) => stream_error(context, err),
        RpcError::Message(err) => message_error(context, err),
        RpcError::UnknownFunction(_) => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_stop_maps_to_sigint_code() {
        let err = stream_error("accept failed", StreamError::Stopped);
        assert_eq!(err.code, STOPPED);
    }

    #[test]
    fn cursor_faults_map_to_data_invalid() {
        let err = rpc_error("call failed", RpcError::Message(MessageError::BadMessage));
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn endpoint_parse_faults_map_to_usage() {
        let err = stream_error(
            "bad endpoint",
            StreamError::InvalidEndpoint("tcp://".to_string()),
        );
        assert_eq!(err.code, USAGE);
    }
}
