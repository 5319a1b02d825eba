use clap::{Parser, Subcommand, ValueEnum};
use quill_config::QuillConfig;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "quill")]
#[command(about = "quill - browser REPL and namespace browser for an embedded Lisp")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute (defaults to serve)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path (defaults to ~/.config/quill/config.toml)
    #[arg(short = 'C', long, global = true, env = "QUILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind (overrides config file)
    #[arg(long, global = true, env = "QUILL_HOST")]
    pub host: Option<String>,

    /// Port to bind (overrides config file)
    #[arg(short, long, global = true, env = "QUILL_PORT")]
    pub port: Option<u16>,

    /// Seconds a request waits for its evaluation (overrides config file)
    #[arg(long, global = true, env = "QUILL_EVAL_TIMEOUT")]
    pub eval_timeout: Option<u64>,

    /// Set log level. Falls back to RUST_LOG, then the config file.
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the web REPL (the default)
    Serve,

    /// Evaluate one expression and print what the REPL would record
    Eval {
        /// Expression text
        expr: String,

        /// Namespace to evaluate in (overrides config file)
        #[arg(long)]
        ns: Option<String>,
    },
}

impl Cli {
    /// Fold command line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut QuillConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(timeout) = self.eval_timeout {
            config.repl.eval_timeout_secs = Some(timeout);
        }
        if let Some(Commands::Eval { ns: Some(ns), .. }) = &self.command {
            config.repl.default_namespace = ns.clone();
        }
    }

    /// Explicit flags first; `None` defers to the environment and config.
    pub fn level_override(&self) -> Option<LevelFilter> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => Some(level.into()),
            (None, true) => Some(LevelFilter::DEBUG),
            (None, false) => None,
        }
    }
}
