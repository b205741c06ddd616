use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod call;
pub mod listen;
pub mod send;
pub mod serve;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a message-mode echo server.
    Listen(ListenArgs),
    /// Send one text message and print the reply.
    Send(SendArgs),
    /// Start the RPC demo server (add, add-with-callbacks).
    Serve(ServeArgs),
    /// Invoke the remote add service.
    Call(CallArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Serve(args) => serve::run(args, format),
        Command::Call(args) => call::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Endpoint to bind: a socket path or tcp://host:port.
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Endpoint to connect to: a socket path or tcp://host:port.
    pub endpoint: String,
    /// Text to send.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Endpoint to bind: a socket path or tcp://host:port.
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Endpoint to connect to: a socket path or tcp://host:port.
    pub endpoint: String,
    /// First addend.
    #[arg(allow_negative_numbers = true)]
    pub a: i32,
    /// Second addend.
    #[arg(allow_negative_numbers = true)]
    pub b: i32,
    /// Route the addends through client-side callbacks instead of
    /// sending them in the request.
    #[arg(long)]
    pub callbacks: bool,
}
