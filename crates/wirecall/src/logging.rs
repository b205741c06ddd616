use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Which layer of the stack to log from.
///
/// The library logs at two boundaries: the socket plumbing
/// (bind/accept/connect, frame I/O) and the call machinery (dispatch,
/// pump, server loop). Scoping to one keeps a noisy investigation
/// readable.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogScope {
    /// Everything, CLI included.
    All,
    /// Socket plumbing only.
    Stream,
    /// RPC machinery only.
    Rpc,
}

impl LogLevel {
    fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl LogScope {
    fn as_targets(self, level: LevelFilter) -> Targets {
        match self {
            LogScope::All => Targets::new().with_default(level),
            LogScope::Stream => Targets::new().with_target("wirecall_stream", level),
            LogScope::Rpc => Targets::new().with_target("wirecall_rpc", level),
        }
    }
}

pub fn init_logging(format: LogFormat, level: LogLevel, scope: LogScope) {
    let targets = scope.as_targets(level.as_filter());
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = tracing_subscriber::registry()
                .with(targets)
                .with(fmt)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::registry()
                .with(targets)
                .with(fmt.json())
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn stream_scope_drops_rpc_events() {
        let targets = LogScope::Stream.as_targets(LevelFilter::DEBUG);
        assert!(targets.would_enable("wirecall_stream::server", &Level::DEBUG));
        assert!(!targets.would_enable("wirecall_rpc::server", &Level::ERROR));
    }

    #[test]
    fn rpc_scope_drops_stream_events() {
        let targets = LogScope::Rpc.as_targets(LevelFilter::DEBUG);
        assert!(targets.would_enable("wirecall_rpc::caller", &Level::DEBUG));
        assert!(!targets.would_enable("wirecall_stream::endpoint", &Level::ERROR));
    }

    #[test]
    fn all_scope_keeps_every_target_up_to_level() {
        let targets = LogScope::All.as_targets(LevelFilter::INFO);
        assert!(targets.would_enable("wirecall_stream::stream", &Level::INFO));
        assert!(targets.would_enable("wirecall_rpc::caller", &Level::WARN));
        assert!(!targets.would_enable("wirecall_rpc::caller", &Level::TRACE));
    }
}
