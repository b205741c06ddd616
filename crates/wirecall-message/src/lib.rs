//! Typed, length-prefixed message cursors for wirecall IPC.
//!
//! A message is one contiguous frame: a 4-byte little-endian length prefix
//! (counting itself) followed by a sequence of typed elements. In tagged
//! mode (the default) every element carries a single discriminator byte so
//! extraction can verify it reads what the peer wrote.
//!
//! [`OutMessage`] appends, [`InMessage`] extracts; both latch a fail flag on
//! the first error and reject everything afterwards. The [`Encode`] and
//! [`Decode`] traits compose the primitives into tuples and user types.

pub mod codec;
pub mod error;
pub mod reader;
pub mod remote;
pub mod tag;
pub mod writer;

/// Width of the length prefix in bytes (little-endian `u32`).
pub const LEN_PREFIX_SIZE: usize = 4;

/// Default hard cap on one message, prefix included.
pub const DEFAULT_MAX_MESSAGE: usize = 64 * 1024;

/// Whether elements carry a type discriminator byte.
///
/// Disabled by the `untagged` cargo feature. Peers must build with the
/// same setting.
pub const USE_TAGS: bool = cfg!(not(feature = "untagged"));

pub use codec::{Decode, Encode};
pub use error::{MessageError, Result};
pub use reader::InMessage;
pub use remote::RemotePtr;
pub use tag::TypeTag;
pub use writer::OutMessage;
