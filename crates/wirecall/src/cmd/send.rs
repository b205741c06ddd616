use std::str::FromStr;

use wirecall_message::{InMessage, OutMessage};
use wirecall_stream::Endpoint;

use crate::cmd::SendArgs;
use crate::exit::{message_error, stream_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let endpoint = Endpoint::from_str(&args.endpoint)
        .map_err(|err| stream_error("bad endpoint", err))?;
    let mut conn = endpoint
        .connect()
        .map_err(|err| stream_error("connect failed", err))?;
    let pred = || true;

    let mut output = OutMessage::new();
    output
        .write_str(&args.text)
        .map_err(|err| message_error("encode failed", err))?;
    if !conn
        .write_message(&output, &pred)
        .map_err(|err| stream_error("send failed", err))?
    {
        return Err(CliError::new(FAILURE, "send interrupted"));
    }

    let mut input = InMessage::new();
    if !conn
        .read_message(&mut input, &pred)
        .map_err(|err| stream_error("receive failed", err))?
    {
        return Err(CliError::new(FAILURE, "receive interrupted"));
    }
    let reply = input
        .read_str()
        .map_err(|err| message_error("decode failed", err))?;

    conn.shutdown()
        .map_err(|err| stream_error("shutdown failed", err))?;

    print_reply(&reply, format);
    Ok(SUCCESS)
}
