use tracing::{debug, info};
use wirecall_message::{InMessage, OutMessage};
use wirecall_stream::{PointToPoint, ServerSocket, StreamError};

use crate::error::{Result, RpcError};

/// Capability set a server loop needs from user code.
pub trait Dispatcher {
    /// Invoke the service named by `id`.
    ///
    /// The remaining arguments follow in `input`; the reply belongs in
    /// `output`, led by [`DONE_TAG`](crate::DONE_TAG) (a
    /// [`FunctionInvoker::service`](crate::FunctionInvoker::service)
    /// adapter produces both). A service may call back into the client
    /// through `socket` before replying.
    fn invoke(
        &self,
        id: u32,
        input: &mut InMessage,
        output: &mut OutMessage,
        socket: &mut PointToPoint,
    ) -> Result<()>;

    /// Called with every per-connection failure; the loop then resumes.
    fn report_error(&self, err: &RpcError);

    /// Called once, before the first accept.
    fn ready(&self);
}

/// Serial accept → dispatch → reply loop over a listening socket.
///
/// One request per connection, with any number of nested callbacks in
/// between. The loop performs no thread creation; parallelism, if wanted,
/// is the caller's to arrange around multiple instances.
pub struct RpcServer<S: ServerSocket> {
    socket: S,
}

impl<S: ServerSocket> RpcServer<S> {
    pub fn new(socket: S) -> Self {
        Self { socket }
    }

    /// Borrow the listening socket.
    pub fn socket(&self) -> &S {
        &self.socket
    }

    /// Run until the predicate trips.
    ///
    /// Per-connection failures are routed through
    /// [`Dispatcher::report_error`] and the loop resumes with the next
    /// accept. A user stop ([`StreamError::Stopped`]) unwinds out of `run`
    /// to the caller, from any of the blocking points.
    pub fn run<D, P>(&self, dispatcher: &D, pred: &P) -> Result<()>
    where
        D: Dispatcher,
        P: Fn() -> bool,
    {
        dispatcher.ready();
        info!("rpc server entering accept loop");
        loop {
            let mut socket = self.socket.accept(pred)?;
            match serve_connection(&mut socket, dispatcher, pred) {
                Ok(()) => {}
                Err(err) if err.is_stopped() => return Err(err),
                Err(err) => dispatcher.report_error(&err),
            }
        }
    }
}

fn serve_connection<D, P>(socket: &mut PointToPoint, dispatcher: &D, pred: &P) -> Result<()>
where
    D: Dispatcher,
    P: Fn() -> bool,
{
    let mut input = InMessage::new();
    let mut output = OutMessage::new();

    if !socket.read_message(&mut input, pred)? {
        return Err(StreamError::Stopped.into());
    }

    let id = input.peek_u32()?;
    // Position the cursor at the first argument for the dispatcher.
    input.read_u32()?;
    debug!(id, "dispatching service");
    dispatcher.invoke(id, &mut input, &mut output, socket)?;

    if !socket.write_message(&output, pred)? {
        return Err(StreamError::Stopped.into());
    }

    // The peer closing its end confirms it consumed the reply.
    socket.wait_for_shutdown(pred)?;
    Ok(())
}
