//! Command line configuration

use std::path::PathBuf;

use clap::Parser;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8800;

/// Default append-only log file
pub const DEFAULT_LOG_FILE: &str = "/tmp/tcpserver.log";

#[derive(Parser, Debug, Clone)]
#[command(name = "chat_relay")]
#[command(about = "Line-oriented TCP chat relay with a single shared room", long_about = None)]
pub struct Config {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// File the log is appended to
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Address to bind, as `host:port`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
