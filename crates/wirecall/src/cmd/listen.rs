use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wirecall_message::{InMessage, OutMessage};
use wirecall_stream::{Endpoint, PointToPoint, ServerSocket, StreamError, TcpServer, UnixServer};

use crate::cmd::ListenArgs;
use crate::exit::{stream_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ListenArgs, _format: OutputFormat) -> CliResult<i32> {
    let endpoint = Endpoint::from_str(&args.endpoint)
        .map_err(|err| stream_error("bad endpoint", err))?;
    let running = install_ctrlc_handler()?;

    match endpoint {
        Endpoint::Unix(path) => {
            let server =
                UnixServer::bind(&path).map_err(|err| stream_error("bind failed", err))?;
            echo_loop(&server, &running)
        }
        Endpoint::Tcp { port, .. } => {
            let server = TcpServer::bind(port).map_err(|err| stream_error("bind failed", err))?;
            echo_loop(&server, &running)
        }
    }
}

fn echo_loop<S: ServerSocket>(server: &S, running: &Arc<AtomicBool>) -> CliResult<i32> {
    let flag = Arc::clone(running);
    let pred = move || flag.load(Ordering::SeqCst);
    tracing::info!("echo server ready");

    loop {
        let mut conn = match server.accept(&pred) {
            Ok(conn) => conn,
            Err(StreamError::Stopped) => return Ok(SUCCESS),
            Err(err) => return Err(stream_error("accept failed", err)),
        };

        match serve_one(&mut conn, &pred) {
            Ok(()) => {}
            Err(StreamError::Stopped) => return Ok(SUCCESS),
            Err(err) => tracing::warn!(error = %err, "request failed"),
        }
    }
}

fn serve_one<P: Fn() -> bool>(
    conn: &mut PointToPoint,
    pred: &P,
) -> Result<(), StreamError> {
    let mut input = InMessage::new();
    if !conn.read_message(&mut input, pred)? {
        return Err(StreamError::Stopped);
    }
    let request = input.read_str()?;
    tracing::info!(len = request.len(), "echoing message");

    let mut output = OutMessage::new();
    output.write_str(&format!("{request} processed"))?;
    if !conn.write_message(&output, pred)? {
        return Err(StreamError::Stopped);
    }

    conn.wait_for_shutdown(pred)?;
    Ok(())
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
