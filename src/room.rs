//! ChatRoom actor implementation
//!
//! The single room owns the roster and is the only code that reads or
//! mutates it. Sessions, actions and the accept loop reach it through a
//! [`RoomHandle`], which only enqueues [`RoomEvent`]s.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::connection::Connection;
use crate::error::{AppError, SendError};
use crate::message;
use crate::session::Session;
use crate::types::{names_match, Member, SessionId};

/// Default capacity of the room event channel
pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// Requests processed by the room loop, one at a time, in arrival order
#[derive(Debug)]
pub enum RoomEvent {
    /// A connection finished name registration
    Join { name: String, connection: Connection },
    /// Remove a session from the roster
    Leave { session_id: SessionId },
    /// Deliver a text fragment to every member
    Broadcast { text: String },
    /// Deliver a private message to every member with a matching name
    DirectMessage {
        from: String,
        targets: Vec<String>,
        body: String,
    },
    /// Remove every member with a matching name
    Kick { targets: Vec<String> },
    /// Snapshot of the roster, in roster order
    Roster { reply: oneshot::Sender<Vec<Member>> },
}

/// Non-owning handle to the room
///
/// Cheap to clone. Everything it offers is a message to the room loop.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomEvent>,
}

impl RoomHandle {
    pub fn new(sender: mpsc::Sender<RoomEvent>) -> Self {
        Self { sender }
    }

    async fn send(&self, event: RoomEvent) -> Result<(), SendError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Register a display name over `connection`, then request a join
    pub async fn join(&self, mut connection: Connection) -> Result<(), AppError> {
        let name = connection.register_name().await?;
        self.send(RoomEvent::Join { name, connection }).await?;
        Ok(())
    }

    pub async fn leave(&self, session_id: SessionId) -> Result<(), SendError> {
        self.send(RoomEvent::Leave { session_id }).await
    }

    pub async fn broadcast(&self, text: impl Into<String>) -> Result<(), SendError> {
        self.send(RoomEvent::Broadcast { text: text.into() }).await
    }

    pub async fn direct_message(
        &self,
        from: String,
        targets: Vec<String>,
        body: String,
    ) -> Result<(), SendError> {
        self.send(RoomEvent::DirectMessage {
            from,
            targets,
            body,
        })
        .await
    }

    pub async fn kick(&self, targets: Vec<String>) -> Result<(), SendError> {
        self.send(RoomEvent::Kick { targets }).await
    }

    /// Current members, in roster order
    pub async fn roster(&self) -> Result<Vec<Member>, SendError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomEvent::Roster { reply }).await?;
        response.await.map_err(|_| SendError::ChannelClosed)
    }
}

/// The room actor
///
/// The roster is an ordered `Vec`, unique by [`SessionId`]; display names
/// may repeat.
pub struct ChatRoom {
    roster: Vec<Session>,
    receiver: mpsc::Receiver<RoomEvent>,
    /// Handed to new sessions; weak so the loop ends once every handle is gone
    sessions_handle: mpsc::WeakSender<RoomEvent>,
}

impl ChatRoom {
    /// Create the room and the first handle to it
    pub fn new(capacity: usize) -> (Self, RoomHandle) {
        let (sender, receiver) = mpsc::channel(capacity);
        let room = Self {
            roster: Vec::new(),
            receiver,
            sessions_handle: sender.downgrade(),
        };
        (room, RoomHandle::new(sender))
    }

    /// Run the room event loop
    ///
    /// Continuously receives and processes events until all handles are dropped.
    pub async fn run(mut self) {
        info!("ChatRoom started");

        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event).await;
        }

        info!("ChatRoom shutting down");
    }

    async fn handle_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Join { name, connection } => self.handle_join(name, connection),
            RoomEvent::Leave { session_id } => self.handle_leave(session_id).await,
            RoomEvent::Broadcast { text } => self.broadcast(&text),
            RoomEvent::DirectMessage {
                from,
                targets,
                body,
            } => self.handle_direct_message(&from, &targets, &body),
            RoomEvent::Kick { targets } => self.handle_kick(&targets).await,
            RoomEvent::Roster { reply } => {
                let _ = reply.send(self.members());
            }
        }
    }

    /// Start a session, add it to the roster and announce it to everyone,
    /// the newcomer included
    fn handle_join(&mut self, name: String, connection: Connection) {
        let Some(sender) = self.sessions_handle.upgrade() else {
            debug!("Room closing, dropping join from {}", connection.peer());
            return;
        };

        let session = Session::start(name, connection, RoomHandle::new(sender));
        info!("Session {} joined as '{}'", session.id(), session.name());

        let announcement = message::joined(session.name());
        self.roster.push(session);
        debug!("Total sessions: {}", self.roster.len());

        self.broadcast(&announcement);
    }

    /// Farewell, removal, close and announcement, in that order
    ///
    /// Unknown ids are ignored.
    async fn handle_leave(&mut self, session_id: SessionId) {
        let Some(index) = self.roster.iter().position(|s| s.id() == session_id) else {
            debug!("Leave for unknown session {}", session_id);
            return;
        };

        if let Err(e) = self.roster[index].farewell().await {
            error!("Farewell write error for {}: {}", session_id, e);
        }

        // `Vec::remove` keeps the remaining members in order
        let session = self.roster.remove(index);
        let announcement = message::left(session.name());
        info!("Session {} ('{}') left", session.id(), session.name());
        session.close().await;
        debug!("Total sessions: {}", self.roster.len());

        self.broadcast(&announcement);
    }

    fn broadcast(&self, text: &str) {
        for session in &self.roster {
            if let Err(e) = session.send(text) {
                debug!("Broadcast to {} dropped: {}", session.id(), e);
            }
        }
    }

    /// Each target name is matched independently, so a name shared by
    /// several members reaches all of them
    fn handle_direct_message(&self, from: &str, targets: &[String], body: &str) {
        for target in targets {
            for session in self.roster.iter().filter(|s| names_match(target, s.name())) {
                let delivered = session
                    .send(from)
                    .and_then(|_| session.send(message::DM_MARKER))
                    .and_then(|_| session.send(body))
                    .and_then(|_| session.send(message::TERMINATOR));
                if let Err(e) = delivered {
                    debug!("Direct message to {} dropped: {}", session.id(), e);
                }
            }
        }
    }

    async fn handle_kick(&mut self, targets: &[String]) {
        for target in targets {
            let matching: Vec<SessionId> = self
                .roster
                .iter()
                .filter(|s| names_match(target, s.name()))
                .map(Session::id)
                .collect();
            for session_id in matching {
                info!("Kicking session {} ('{}')", session_id, target);
                self.handle_leave(session_id).await;
            }
        }
    }

    fn members(&self) -> Vec<Member> {
        self.roster
            .iter()
            .map(|s| Member {
                id: s.id(),
                name: s.name().to_string(),
            })
            .collect()
    }
}
