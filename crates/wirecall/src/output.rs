use std::io::IsTerminal;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Text
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    reply: &'a str,
}

/// Print a message-mode reply.
pub fn print_reply(reply: &str, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{reply}"),
        OutputFormat::Json => {
            let out = ReplyOutput { reply };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
    }
}

#[derive(Serialize)]
struct CallOutput {
    result: i32,
}

/// Print an RPC call result.
pub fn print_result(result: i32, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{result}"),
        OutputFormat::Json => {
            let out = CallOutput { result };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
    }
}
