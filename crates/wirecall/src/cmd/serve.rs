use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wirecall_message::{InMessage, OutMessage, RemotePtr};
use wirecall_rpc::{Dispatcher, FunctionInvoker, RpcError, RpcServer, ServiceInvoker};
use wirecall_stream::{Endpoint, PointToPoint, ServerSocket, TcpServer, UnixServer};

use crate::cmd::ServeArgs;
use crate::exit::{rpc_error, stream_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

/// Demo service ids (client → server).
pub(crate) const ADD: u32 = 1;
pub(crate) const ADD_WITH_CALLBACKS: u32 = 2;

/// Demo callback ids (server → client).
pub(crate) const ARG1: u32 = 100;
pub(crate) const ARG2: u32 = 101;

pub fn run(args: ServeArgs, _format: OutputFormat) -> CliResult<i32> {
    let endpoint = Endpoint::from_str(&args.endpoint)
        .map_err(|err| stream_error("bad endpoint", err))?;
    let running = install_ctrlc_handler()?;

    match endpoint {
        Endpoint::Unix(path) => {
            let server =
                UnixServer::bind(&path).map_err(|err| stream_error("bind failed", err))?;
            serve_loop(RpcServer::new(server), running)
        }
        Endpoint::Tcp { port, .. } => {
            let server = TcpServer::bind(port).map_err(|err| stream_error("bind failed", err))?;
            serve_loop(RpcServer::new(server), running)
        }
    }
}

fn serve_loop<S: ServerSocket>(server: RpcServer<S>, running: Arc<AtomicBool>) -> CliResult<i32> {
    let dispatcher = DemoDispatcher {
        running: Arc::clone(&running),
    };
    let flag = Arc::clone(&running);
    let pred = move || flag.load(Ordering::SeqCst);

    match server.run(&dispatcher, &pred) {
        Ok(()) => Ok(SUCCESS),
        Err(err) if err.is_stopped() => Ok(SUCCESS),
        Err(err) => Err(rpc_error("server failed", err)),
    }
}

/// Dispatcher for the demo arithmetic services.
struct DemoDispatcher {
    running: Arc<AtomicBool>,
}

impl Dispatcher for DemoDispatcher {
    fn invoke(
        &self,
        id: u32,
        input: &mut InMessage,
        output: &mut OutMessage,
        socket: &mut PointToPoint,
    ) -> wirecall_rpc::Result<()> {
        match id {
            ADD => FunctionInvoker::service().invoke(input, output, |a: i32, b: i32| a + b),
            ADD_WITH_CALLBACKS => {
                let invoker = FunctionInvoker::service();
                let (ptr,): (RemotePtr,) = invoker.read_args(input)?;

                let running = Arc::clone(&self.running);
                let pred = move || running.load(Ordering::SeqCst);
                let a: i32 =
                    ServiceInvoker.call_by_channel(ARG1, socket, input, output, &pred, (ptr,))?;
                let b: i32 =
                    ServiceInvoker.call_by_channel(ARG2, socket, input, output, &pred, (ptr,))?;

                invoker.write_reply(output, a + b)
            }
            other => Err(RpcError::UnknownFunction(other)),
        }
    }

    fn report_error(&self, err: &RpcError) {
        tracing::warn!(error = %err, "request failed");
    }

    fn ready(&self) {
        tracing::info!("rpc server ready");
    }
}

fn install_ctrlc_handler() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })?;
    Ok(running)
}
