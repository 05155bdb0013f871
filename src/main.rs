//! Chat relay - Entry Point
//!
//! Sets up logging, binds the TCP listener, starts the ChatRoom actor and
//! accepts connections.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use chat_relay::room::CHANNEL_BUFFER_SIZE;
use chat_relay::{serve, AppError, ChatRoom, Config};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::parse();
    let _guard = chat_relay::logger::setup_logger(&config)?;

    let addr = config.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return Err(e.into());
        }
    };
    info!("Server started!! Listening on {}", addr);

    let (room, handle) = ChatRoom::new(CHANNEL_BUFFER_SIZE);
    tokio::spawn(room.run());

    serve(listener, handle).await
}
