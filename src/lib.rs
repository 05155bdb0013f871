//! Line-oriented TCP Chat Relay Library
//!
//! Clients connect over a byte stream, register a display name and exchange
//! broadcast or direct messages through one shared room.
//!
//! # Protocol
//! - The server asks `What's your name? ` until a non-blank line arrives
//! - Plain lines are broadcast as `<name>: <line>`
//! - `.msg <text...>` broadcasts explicitly
//! - `.dm <name...> <message>` sends a private message
//! - `.kick <name...>` disconnects every session with one of the names
//! - `.quit` disconnects the sender
//!
//! Command names are case-insensitive; a double quote groups words into one
//! argument.
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatRoom` is the only owner of the roster and processes one event at a time
//! - Each session runs a reader, a writer and a bridge task
//! - No locks on shared state - the roster is reached only through `RoomHandle`
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{serve, ChatRoom};
//! use chat_relay::room::CHANNEL_BUFFER_SIZE;
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("0.0.0.0:8800").await.unwrap();
//!     let (room, handle) = ChatRoom::new(CHANNEL_BUFFER_SIZE);
//!     tokio::spawn(room.run());
//!     serve(listener, handle).await.unwrap();
//! }
//! ```

pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod logger;
pub mod message;
pub mod room;
pub mod server;
pub mod session;
pub mod tokenizer;
pub mod types;

// Re-export main types for convenience
pub use command::{execute, parse, Command, ParsedLine};
pub use config::Config;
pub use connection::Connection;
pub use error::{AppError, CommandError, SendError};
pub use room::{ChatRoom, RoomEvent, RoomHandle};
pub use server::serve;
pub use session::{Session, SessionContext};
pub use tokenizer::{tokenize, Tokens};
pub use types::{Member, SessionId};
