//! Client sessions
//!
//! A session is one registered participant. It owns two FIFO queues:
//! - inbound: text produced by this client, forwarded to the room as broadcasts
//! - outbound: text destined for this client's transport
//!
//! Three tasks run per session: a reader (lines -> commands), a writer
//! (outbound queue -> transport) and a bridge (inbound queue -> room).

use std::io;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::command;
use crate::connection::{read_text_line, Connection, LineReader, LineWriter};
use crate::error::{CommandError, SendError};
use crate::message;
use crate::room::RoomHandle;
use crate::types::SessionId;

/// Transport write half, shared by the writer task and the room's farewell
type SharedWriter = Arc<Mutex<LineWriter>>;

/// What a session's own tasks and command actions see of it
///
/// Holds only a [`RoomHandle`], never the roster, so actions reach the room
/// exclusively through its event channel.
#[derive(Debug, Clone)]
pub struct SessionContext {
    id: SessionId,
    name: String,
    inbound: mpsc::UnboundedSender<String>,
    room: RoomHandle,
}

impl SessionContext {
    pub fn new(
        id: SessionId,
        name: String,
        inbound: mpsc::UnboundedSender<String>,
        room: RoomHandle,
    ) -> Self {
        Self {
            id,
            name,
            inbound,
            room,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn room(&self) -> &RoomHandle {
        &self.room
    }

    /// Queue a fragment for room-wide broadcast
    pub fn send_inbound(&self, fragment: impl Into<String>) -> Result<(), SendError> {
        self.inbound
            .send(fragment.into())
            .map_err(|_| SendError::ChannelClosed)
    }
}

/// A roster entry, owned by the room loop
pub struct Session {
    id: SessionId,
    name: String,
    outbound: mpsc::UnboundedSender<String>,
    writer: SharedWriter,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
    bridge_task: JoinHandle<()>,
}

impl Session {
    /// Build a session from a registered connection and start its tasks
    pub fn start(name: String, connection: Connection, room: RoomHandle) -> Self {
        let id = SessionId::new();
        let Connection { reader, writer, .. } = connection;
        let writer = Arc::new(Mutex::new(writer));

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let context = SessionContext::new(id, name.clone(), inbound_tx, room.clone());

        let writer_task = tokio::spawn(write_loop(id, writer.clone(), outbound_rx));
        let reader_task = tokio::spawn(read_loop(context, reader));
        let bridge_task = tokio::spawn(bridge(id, inbound_rx, room));

        Self {
            id,
            name,
            outbound: outbound_tx,
            writer,
            writer_task,
            reader_task,
            bridge_task,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a fragment for this client's transport
    pub fn send(&self, fragment: impl Into<String>) -> Result<(), SendError> {
        self.outbound
            .send(fragment.into())
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Write the farewell line straight to the transport, skipping the queue
    ///
    /// The writer task is stopped first; nothing queued after this point
    /// reaches the client.
    pub async fn farewell(&self) -> io::Result<()> {
        self.writer_task.abort();
        let mut writer = self.writer.lock().await;
        writer.write_all(message::FAREWELL.as_bytes()).await?;
        writer.flush().await
    }

    /// Stop all tasks, then shut the transport down
    ///
    /// Tasks are aborted first, so nothing is left writing into a queue that
    /// is about to disappear.
    pub async fn close(self) {
        self.reader_task.abort();
        self.bridge_task.abort();
        self.writer_task.abort();

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            debug!("Shutdown error for {}: {}", self.id, e);
        }
        debug!("Session {} closed", self.id);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Outbound queue -> transport, flushing at every line end
async fn write_loop(
    id: SessionId,
    writer: SharedWriter,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    while let Some(fragment) = outbound.recv().await {
        let mut writer = writer.lock().await;
        if let Err(e) = writer.write_all(fragment.as_bytes()).await {
            error!("Write error for {}: {}", id, e);
        }
        if message::ends_line(&fragment) {
            if let Err(e) = writer.flush().await {
                error!("Flush error for {}: {}", id, e);
            }
        }
    }
    debug!("Write task ended for {}", id);
}

/// Transport lines -> command dispatch
///
/// Ends on end of stream, a read error or an overlong line, and then asks
/// the room to remove this session.
async fn read_loop(context: SessionContext, mut reader: LineReader) {
    loop {
        match read_text_line(&mut reader).await {
            Ok(Some(line)) => match command::execute(&context, &line).await {
                Ok(()) => {}
                Err(CommandError::Room(e)) => {
                    debug!("Room unavailable for {}: {}", context.id(), e);
                    return;
                }
                Err(e) => {
                    warn!("Rejected line from {}: {}", context.id(), e);
                }
            },
            Ok(None) => {
                debug!("Session {} reached end of stream", context.id());
                break;
            }
            Err(e) => {
                error!("Read error for {}: {}", context.id(), e);
                break;
            }
        }
    }

    if let Err(e) = context.room().leave(context.id()).await {
        debug!("Room closed, cannot leave {}: {}", context.id(), e);
    }
}

/// Inbound queue -> room broadcast requests
async fn bridge(
    id: SessionId,
    mut inbound: mpsc::UnboundedReceiver<String>,
    room: RoomHandle,
) {
    while let Some(fragment) = inbound.recv().await {
        if room.broadcast(fragment).await.is_err() {
            debug!("Room closed, ending bridge for {}", id);
            break;
        }
    }
}
