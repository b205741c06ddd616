use wirecall_message::{Decode, Encode, InMessage, OutMessage};

use crate::error::Result;
use crate::DONE_TAG;

/// Marshalling adapter binding one callable to one message exchange.
///
/// The adapter deals in owned values of the argument types and performs no
/// socket I/O. Server-side services use [`service`](FunctionInvoker::service)
/// so their reply is prefixed with [`DONE_TAG`]; client-side callbacks use
/// [`callback`](FunctionInvoker::callback) and emit a bare reply, which the
/// remote pump distinguishes from a nested call by peeking the leading id.
#[derive(Debug, Clone, Copy)]
pub struct FunctionInvoker {
    reply_with_done: bool,
}

impl FunctionInvoker {
    /// Adapter for a server-side service.
    pub fn service() -> Self {
        Self {
            reply_with_done: true,
        }
    }

    /// Adapter for a client-side callback.
    pub fn callback() -> Self {
        Self {
            reply_with_done: false,
        }
    }

    /// Extract the argument tuple from `input` in declaration order.
    ///
    /// Extraction errors propagate; the caller's pump treats them as a
    /// protocol fault.
    pub fn read_args<Args: Decode>(&self, input: &mut InMessage) -> Result<Args> {
        Ok(Args::decode(input)?)
    }

    /// Build the reply buffer for a computed result.
    ///
    /// The output cursor is rebuilt from scratch here, after the user
    /// callable has returned, so a service that issued nested callbacks
    /// through the same buffers finds them free to reuse in between.
    pub fn write_reply<R: Encode>(&self, output: &mut OutMessage, reply: R) -> Result<()> {
        output.clear();
        if self.reply_with_done {
            output.write_u32(DONE_TAG)?;
        }
        reply.encode(output)?;
        Ok(())
    }

    /// Extract arguments, call `f`, and build the reply in one step.
    ///
    /// Services that call back into the client between extraction and
    /// reply use [`read_args`](FunctionInvoker::read_args) and
    /// [`write_reply`](FunctionInvoker::write_reply) directly instead.
    pub fn invoke<Args, R, F>(
        &self,
        input: &mut InMessage,
        output: &mut OutMessage,
        f: F,
    ) -> Result<()>
    where
        Args: Decode,
        R: Encode,
        F: Callable<Args, Output = R>,
    {
        let args = self.read_args::<Args>(input)?;
        let reply = f.call(args);
        self.write_reply(output, reply)
    }
}

/// Callables of arity 0..=8 viewed uniformly over their argument tuple.
///
/// Lets invokers accept ordinary closures (`|a, b| a + b`) while the
/// marshalling machinery stays generic over one tuple type.
pub trait Callable<Args> {
    type Output;

    fn call(self, args: Args) -> Self::Output;
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<Fun, Out, $($arg),*> Callable<($($arg,)*)> for Fun
        where
            Fun: FnOnce($($arg),*) -> Out,
        {
            type Output = Out;

            #[allow(non_snake_case)]
            fn call(self, ($($arg,)*): ($($arg,)*)) -> Out {
                self($($arg),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(A1);
impl_callable!(A1, A2);
impl_callable!(A1, A2, A3);
impl_callable!(A1, A2, A3, A4);
impl_callable!(A1, A2, A3, A4, A5);
impl_callable!(A1, A2, A3, A4, A5, A6);
impl_callable!(A1, A2, A3, A4, A5, A6, A7);
impl_callable!(A1, A2, A3, A4, A5, A6, A7, A8);

#[cfg(test)]
mod tests {
    use wirecall_message::MessageError;

    use super::*;
    use crate::error::RpcError;

    fn request(build: impl FnOnce(&mut OutMessage)) -> InMessage {
        let mut out = OutMessage::new();
        build(&mut out);
        let mut input = InMessage::new();
        input.attach(out.as_bytes()).expect("frame should attach");
        input
    }

    #[test]
    fn service_reply_leads_with_done_tag() {
        let mut input = request(|out| {
            out.write_i32(3).unwrap();
            out.write_i32(4).unwrap();
        });
        let mut output = OutMessage::new();

        FunctionInvoker::service()
            .invoke(&mut input, &mut output, |a: i32, b: i32| a + b)
            .expect("invoke should succeed");

        let mut reply = InMessage::new();
        reply.attach(output.as_bytes()).unwrap();
        assert_eq!(reply.read_u32().unwrap(), DONE_TAG);
        assert_eq!(reply.read_i32().unwrap(), 7);
        assert_eq!(reply.remaining(), 0);
    }

    #[test]
    fn callback_reply_has_no_prefix() {
        let mut input = request(|out| out.write_i32(21).unwrap());
        let mut output = OutMessage::new();

        FunctionInvoker::callback()
            .invoke(&mut input, &mut output, |v: i32| v * 2)
            .expect("invoke should succeed");

        let mut reply = InMessage::new();
        reply.attach(output.as_bytes()).unwrap();
        assert_eq!(reply.read_i32().unwrap(), 42);
        assert_eq!(reply.remaining(), 0);
    }

    #[test]
    fn void_result_emits_empty_callback_reply() {
        let mut input = request(|out| out.write_str("log me").unwrap());
        let mut output = OutMessage::new();

        let mut seen = None;
        FunctionInvoker::callback()
            .invoke(&mut input, &mut output, |text: String| {
                seen = Some(text);
            })
            .expect("invoke should succeed");

        assert_eq!(seen.as_deref(), Some("log me"));
        assert!(output.is_empty());
    }

    #[test]
    fn stale_output_is_discarded_before_reply() {
        let mut input = request(|out| out.write_i32(1).unwrap());
        let mut output = OutMessage::new();
        output.write_str("leftover from a nested exchange").unwrap();

        FunctionInvoker::service()
            .invoke(&mut input, &mut output, |v: i32| v)
            .expect("invoke should succeed");

        let mut reply = InMessage::new();
        reply.attach(output.as_bytes()).unwrap();
        assert_eq!(reply.read_u32().unwrap(), DONE_TAG);
        assert_eq!(reply.read_i32().unwrap(), 1);
        assert_eq!(reply.remaining(), 0);
    }

    #[test]
    fn argument_extraction_error_propagates() {
        // Request carries one argument; the service expects two.
        let mut input = request(|out| out.write_i32(3).unwrap());
        let mut output = OutMessage::new();

        let err = FunctionInvoker::service()
            .invoke(&mut input, &mut output, |a: i32, b: i32| a + b)
            .unwrap_err();
        assert!(matches!(
            err,
            RpcError::Message(MessageError::TooShort { .. })
        ));
    }

    #[test]
    fn split_form_allows_work_between_args_and_reply() {
        let mut input = request(|out| out.write_u32(10).unwrap());
        let mut output = OutMessage::new();
        let invoker = FunctionInvoker::service();

        let (n,): (u32,) = invoker.read_args(&mut input).unwrap();
        // A real service would run nested callbacks through the buffers
        // here; scribble on them to prove the reply is unaffected.
        output.write_str("scratch").unwrap();
        invoker.write_reply(&mut output, n * 3).unwrap();

        let mut reply = InMessage::new();
        reply.attach(output.as_bytes()).unwrap();
        assert_eq!(reply.read_u32().unwrap(), DONE_TAG);
        assert_eq!(reply.read_u32().unwrap(), 30);
    }
}
