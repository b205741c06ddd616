use tracing::trace;
use wirecall_message::{Decode, Encode, InMessage, OutMessage};
use wirecall_stream::{Endpoint, PointToPoint, StreamError};

use crate::error::{Result, RpcError};
use crate::DONE_TAG;

/// Handles callback requests arriving while a call awaits its result.
///
/// Returning `Ok(false)` means the id is unknown; the pump then aborts
/// the call with [`RpcError::UnknownFunction`].
pub trait Dispatch {
    fn dispatch(
        &mut self,
        id: u32,
        input: &mut InMessage,
        output: &mut OutMessage,
    ) -> Result<bool>;
}

impl<F> Dispatch for F
where
    F: FnMut(u32, &mut InMessage, &mut OutMessage) -> Result<bool>,
{
    fn dispatch(
        &mut self,
        id: u32,
        input: &mut InMessage,
        output: &mut OutMessage,
    ) -> Result<bool> {
        self(id, input, output)
    }
}

/// Dispatch hook for callers that expect no callbacks.
pub fn no_callbacks(_id: u32, _input: &mut InMessage, _output: &mut OutMessage) -> Result<bool> {
    Ok(false)
}

/// Issues remote calls.
///
/// [`call_by_link`](ServiceInvoker::call_by_link) opens a fresh connection
/// and runs the dispatch pump: between sending the request and decoding
/// the `DONE_TAG`-terminated result it services nested callback requests
/// the remote side issues over the same socket. Strict request/reply
/// turn-taking keeps the exchange unambiguous at any callback depth.
///
/// [`call_by_channel`](ServiceInvoker::call_by_channel) is the nested
/// form: a service already inside an exchange calls back over the open
/// socket, reusing the caller's buffers so allocations stay bounded. Its
/// reply is a bare result — callback replies never carry
/// [`DONE_TAG`](crate::DONE_TAG).
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceInvoker;

impl ServiceInvoker {
    /// Call the remote function `id` over a fresh connection to
    /// `endpoint`, then shut the connection down.
    pub fn call_by_link<R, Args, D, P>(
        &self,
        id: u32,
        endpoint: &Endpoint,
        dispatch: D,
        pred: &P,
        args: Args,
    ) -> Result<R>
    where
        R: Decode,
        Args: Encode,
        D: Dispatch,
        P: Fn() -> bool,
    {
        let mut socket = endpoint.connect()?;
        let mut input = InMessage::new();
        let mut output = OutMessage::new();
        let result = dispatch_pump(
            id,
            &mut socket,
            &mut input,
            &mut output,
            dispatch,
            pred,
            args,
        )?;
        socket.shutdown()?;
        Ok(result)
    }

    /// Call the remote function `id` over an already-open socket, reusing
    /// the caller's message buffers.
    ///
    /// This is what a service uses to call back into its client mid-
    /// exchange. The peer answers with a bare result, so no pump runs
    /// here: one request out, one reply in.
    pub fn call_by_channel<R, Args, P>(
        &self,
        id: u32,
        socket: &mut PointToPoint,
        input: &mut InMessage,
        output: &mut OutMessage,
        pred: &P,
        args: Args,
    ) -> Result<R>
    where
        R: Decode,
        Args: Encode,
        P: Fn() -> bool,
    {
        send_call(id, socket, output, pred, args)?;
        if !socket.read_message(input, pred)? {
            return Err(StreamError::Stopped.into());
        }
        trace!(id, "callback reply received");
        Ok(R::decode(input)?)
    }
}

fn send_call<Args, P>(
    id: u32,
    socket: &mut PointToPoint,
    output: &mut OutMessage,
    pred: &P,
    args: Args,
) -> Result<()>
where
    Args: Encode,
    P: Fn() -> bool,
{
    output.clear();
    output.write_u32(id)?;
    args.encode(output)?;
    trace!(id, "issuing call");
    if !socket.write_message(output, pred)? {
        return Err(StreamError::Stopped.into());
    }
    Ok(())
}

/// The dispatch pump: alternate between decoding the final result and
/// servicing nested callback requests, until the peer sends a
/// [`DONE_TAG`]-terminated buffer.
fn dispatch_pump<R, Args, D, P>(
    id: u32,
    socket: &mut PointToPoint,
    input: &mut InMessage,
    output: &mut OutMessage,
    mut dispatch: D,
    pred: &P,
    args: Args,
) -> Result<R>
where
    R: Decode,
    Args: Encode,
    D: Dispatch,
    P: Fn() -> bool,
{
    send_call(id, socket, output, pred, args)?;

    loop {
        if !socket.read_message(input, pred)? {
            return Err(StreamError::Stopped.into());
        }

        let head = input.peek_u32()?;
        if head == DONE_TAG {
            input.read_u32()?;
            trace!(id, "call complete");
            return Ok(R::decode(input)?);
        }

        // A nested callback request; consume its id so the dispatch
        // hook's invoker starts at the first argument.
        let callback_id = input.read_u32()?;
        trace!(callback_id, "servicing nested callback");
        if !dispatch.dispatch(callback_id, input, output)? {
            return Err(RpcError::UnknownFunction(callback_id));
        }
        if !socket.write_message(output, pred)? {
            return Err(StreamError::Stopped.into());
        }
    }
}
