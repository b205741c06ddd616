use wirecall_message::MessageError;
use wirecall_stream::StreamError;

/// Errors raised by RPC machinery.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Marshalling failed on one of the message cursors.
    #[error("message error: {0}")]
    Message(#[from] MessageError),

    /// The underlying stream failed.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// A dispatch hook did not recognize a function id; the peer exchange
    /// is a protocol fault from here on.
    #[error("unknown function id {0}")]
    UnknownFunction(u32),
}

impl RpcError {
    /// True when this error is a user-stop unwinding the call chain, as
    /// opposed to a fault.
    pub fn is_stopped(&self) -> bool {
        matches!(self, RpcError::Stream(StreamError::Stopped))
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_is_distinguished() {
        assert!(RpcError::Stream(StreamError::Stopped).is_stopped());
        assert!(!RpcError::UnknownFunction(3).is_stopped());
        assert!(!RpcError::Message(MessageError::BadMessage).is_stopped());
    }
}
