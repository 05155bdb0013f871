//! TCP accept loop
//!
//! Hands every accepted socket to the room. Name registration runs in the
//! connection's own task so the room loop never waits on a slow client.

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::connection::Connection;
use crate::error::AppError;
use crate::room::RoomHandle;

/// Accept connections until the listener fails
///
/// An accept error is returned to the caller and ends the process; there is
/// no supervisor to restart the listener.
pub async fn serve(listener: TcpListener, room: RoomHandle) -> Result<(), AppError> {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                return Err(e.into());
            }
        };
        info!("New connection from {}", addr);

        let room = room.clone();
        tokio::spawn(async move {
            if let Err(e) = room.join(Connection::new(stream, addr.to_string())).await {
                warn!("Connection {} dropped before joining: {}", addr, e);
            }
        });
    }
}
