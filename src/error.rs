//! Error types for the chat relay
//!
//! Defines process-level errors, per-line command errors and channel send
//! errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Fatal to the process (listener, log file) or to a single connection
/// (name registration).
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (bind/accept failures are fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Log file could not be opened
    #[error("Logging setup error: {0}")]
    Logging(#[from] tracing_appender::rolling::InitError),

    /// Channel send error (the room loop is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Peer closed the stream before registering a name
    #[error("Connection closed during name registration")]
    ConnectionClosed,
}

/// Per-line command errors
///
/// Never fatal: the reader logs them and keeps the session open, except for
/// `Room`, which means there is no room left to talk to.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Line contained no tokens
    #[error("no input")]
    NoInput,

    /// Dot-prefixed name not in the command table
    #[error("invalid command: {0}")]
    UnknownCommand(String),

    /// Request could not reach the room loop
    #[error("room unavailable: {0}")]
    Room(#[from] SendError),
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}

impl From<SendError> for AppError {
    fn from(_: SendError) -> Self {
        AppError::ChannelSend
    }
}
