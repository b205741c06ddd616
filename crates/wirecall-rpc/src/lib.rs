//! Typed RPC over wirecall streams.
//!
//! Two adapters turn an ordinary callable, named by a `u32` function id,
//! into a request/response exchange:
//!
//! - [`FunctionInvoker`] marshals one invocation: it extracts the argument
//!   tuple from an inbound message, calls the user function, and builds the
//!   reply buffer. It never touches a socket.
//! - [`ServiceInvoker`] issues a call and pumps the connection until the
//!   result arrives, transparently servicing nested callback requests the
//!   remote side issues in the meantime.
//!
//! [`RpcServer`] ties them together on the accepting side: one connection
//! at a time, one request per connection, any number of nested callbacks
//! in between. Function ids for services (client → server) and callbacks
//! (server → client) are disjoint numberings chosen by the application;
//! both must avoid [`DONE_TAG`].

pub mod caller;
pub mod error;
pub mod invoker;
pub mod server;

/// Reserved function id marking a buffer as the final result of a call
/// rather than a nested callback request.
///
/// Application service and callback id enums must not use this value.
pub const DONE_TAG: u32 = 0xFFFF_FFFF;

pub use caller::{no_callbacks, Dispatch, ServiceInvoker};
pub use error::{Result, RpcError};
pub use invoker::{Callable, FunctionInvoker};
pub use server::{Dispatcher, RpcServer};
