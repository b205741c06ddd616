mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel, LogScope};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "wirecall", version, about = "Message and RPC IPC over stream sockets")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Restrict logs to one layer of the stack (stderr).
    #[arg(long, value_name = "SCOPE", default_value = "all", global = true)]
    log_scope: LogScope,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level, cli.log_scope);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from(["wirecall", "send", "/tmp/test.sock", "hello"])
            .expect("send args should parse");

        assert!(matches!(cli.command, Command::Send(_)));
    }

    #[test]
    fn parses_call_with_callbacks_flag() {
        let cli = Cli::try_parse_from(["wirecall", "call", "/tmp/test.sock", "3", "4", "--callbacks"])
            .expect("call args should parse");

        match cli.command {
            Command::Call(args) => {
                assert_eq!((args.a, args.b), (3, 4));
                assert!(args.callbacks);
            }
            other => panic!("expected call command, got {other:?}"),
        }
    }

    #[test]
    fn parses_log_scope_flag() {
        let cli = Cli::try_parse_from([
            "wirecall",
            "--log-scope",
            "stream",
            "listen",
            "/tmp/test.sock",
        ])
        .expect("log scope should parse");

        assert!(matches!(cli.log_scope, LogScope::Stream));
    }

    #[test]
    fn parses_tcp_endpoint_for_serve() {
        let cli = Cli::try_parse_from(["wirecall", "serve", "tcp://0.0.0.0:9000"])
            .expect("serve args should parse");

        assert!(matches!(cli.command, Command::Serve(_)));
    }

    #[test]
    fn rejects_missing_addends() {
        let err = Cli::try_parse_from(["wirecall", "call", "/tmp/test.sock"])
            .expect_err("missing addends should fail");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }
}
