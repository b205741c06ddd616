use std::str::FromStr;

use wirecall_message::{InMessage, OutMessage, RemotePtr};
use wirecall_rpc::{no_callbacks, FunctionInvoker, ServiceInvoker};
use wirecall_stream::Endpoint;

use crate::cmd::serve::{ADD, ADD_WITH_CALLBACKS, ARG1, ARG2};
use crate::cmd::CallArgs;
use crate::exit::{rpc_error, stream_error, CliResult, SUCCESS};
use crate::output::{print_result, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let endpoint = Endpoint::from_str(&args.endpoint)
        .map_err(|err| stream_error("bad endpoint", err))?;
    let pred = || true;

    let result: i32 = if args.callbacks {
        let ctx = AddContext {
            a: args.a,
            b: args.b,
        };
        let token = RemotePtr::from_ref(&ctx);

        let dispatch = |id: u32,
                        input: &mut InMessage,
                        output: &mut OutMessage|
         -> wirecall_rpc::Result<bool> {
            match id {
                ARG1 => {
                    FunctionInvoker::callback().invoke(input, output, |_p: RemotePtr| ctx.a)?;
                    Ok(true)
                }
                ARG2 => {
                    FunctionInvoker::callback().invoke(input, output, |_p: RemotePtr| ctx.b)?;
                    Ok(true)
                }
                _ => Ok(false),
            }
        };

        ServiceInvoker
            .call_by_link(ADD_WITH_CALLBACKS, &endpoint, dispatch, &pred, (token,))
            .map_err(|err| rpc_error("call failed", err))?
    } else {
        ServiceInvoker
            .call_by_link(ADD, &endpoint, no_callbacks, &pred, (args.a, args.b))
            .map_err(|err| rpc_error("call failed", err))?
    };

    print_result(result, format);
    Ok(SUCCESS)
}

/// Context the demo callbacks read the addends from; the server only ever
/// sees its opaque token.
struct AddContext {
    a: i32,
    b: i32,
}
