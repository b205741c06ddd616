/// Errors raised by message cursors.
///
/// Every error latches the originating cursor's fail flag; once latched,
/// all further operations report [`MessageError::BadMessage`] until the
/// cursor is cleared or re-attached.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Operation attempted on a cursor whose fail flag is already set.
    #[error("bad message: cursor fail flag is set")]
    BadMessage,

    /// Appending would grow the message past its size limit.
    #[error("message overflow ({required} bytes required, limit {max})")]
    Overflow { required: usize, max: usize },

    /// Extraction needs more bytes than the message holds.
    #[error("message too short ({required} bytes required, {len} available)")]
    TooShort { required: usize, len: usize },

    /// A string is missing its terminator, or a blob length runs past the
    /// end of the message.
    #[error("container overflow: {0}")]
    ContainerOverflow(String),

    /// Tagged-mode discriminator does not match the requested type.
    #[error("type mismatch (got {got}, expected {expected})")]
    TypeMismatch {
        got: &'static str,
        expected: &'static str,
    },

    /// String payload bytes are not valid UTF-8.
    #[error("string payload is not valid utf-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// An attached frame's declared length disagrees with its byte count.
    #[error("frame length mismatch (declared {declared}, buffer {actual})")]
    LengthMismatch { declared: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, MessageError>;
