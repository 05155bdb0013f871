//! Line-oriented transport
//!
//! Wraps any byte stream into a buffered line reader and a buffered text
//! writer, and runs the name registration exchange over it.
//!
//! Lines are capped at [`MAX_LINE_LENGTH`] bytes and decoded lossily, so a
//! stray non-UTF-8 byte is relayed as U+FFFD instead of failing the read.

use std::io;

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};
use tracing::{debug, error};

use crate::error::AppError;
use crate::message::NAME_PROMPT;

/// Buffered read half of a connection, yields lines
pub type LineReader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;

/// Buffered write half of a connection, accepts text
pub type LineWriter = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

/// Longest accepted line, terminator excluded
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Read one line without its `\n` or `\r\n` terminator
///
/// Returns `Ok(None)` at end of stream. A final line without terminator is
/// still returned. A line longer than [`MAX_LINE_LENGTH`] fails with
/// `ErrorKind::InvalidData`.
pub async fn read_text_line(reader: &mut LineReader) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    let limit = MAX_LINE_LENGTH as u64 + 1;
    let n = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > MAX_LINE_LENGTH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line longer than {} bytes", MAX_LINE_LENGTH),
        ));
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// A raw client connection before it becomes a session
pub struct Connection {
    pub(crate) reader: LineReader,
    pub(crate) writer: LineWriter,
    peer: String,
}

impl Connection {
    /// Split a stream into buffered read and write halves
    pub fn new<S>(stream: S, peer: impl Into<String>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(read_half);
        let writer: Box<dyn AsyncWrite + Send + Unpin> = Box::new(write_half);
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            peer: peer.into(),
        }
    }

    /// Remote address or other label for logging
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Ask for a display name until a non-blank answer arrives
    ///
    /// Read errors re-ask the question. End of stream gives up, since the
    /// peer can no longer answer, and so does an overlong line.
    pub async fn register_name(&mut self) -> Result<String, AppError> {
        loop {
            self.writer.write_all(NAME_PROMPT.as_bytes()).await?;
            self.writer.flush().await?;

            match read_text_line(&mut self.reader).await {
                Ok(None) => return Err(AppError::ConnectionClosed),
                Ok(Some(answer)) => {
                    let name = answer.trim();
                    if !name.is_empty() {
                        debug!("{} registered as '{}'", self.peer, name);
                        return Ok(name.to_string());
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    error!("Name registration from {} rejected: {}", self.peer, e);
                    return Err(e.into());
                }
                Err(e) => {
                    error!("Name registration read error from {}: {}", self.peer, e);
                }
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("peer", &self.peer).finish()
    }
}
