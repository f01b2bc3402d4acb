//! TCP connection to the WordDuel server.
//!
//! The write half stays with [`ServerConnection`]; a background task owns the
//! read half, decodes one message per inbound chunk, and forwards it on an
//! unbounded channel as [`ServerEvent`]s.

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use wordduel_core::{decode_message, encode_message, Message, PlayerId};

/// Errors that can occur in the client network layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP connection to the server failed.
    #[error("failed to connect to server at {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed by the server.
    #[error("connection closed by server")]
    Closed,

    /// The server rejected the password.
    #[error("authentication rejected: {0}")]
    Rejected(String),

    /// The server sent something other than the expected handshake reply.
    #[error("unexpected handshake reply: {0:?}")]
    UnexpectedReply(Message),
}

/// Events delivered by the background read task.
#[derive(Debug)]
pub enum ServerEvent {
    /// A message was received from the server.
    Message(Message),
    /// The server closed the connection (or the read failed).
    Disconnected,
}

/// One established connection to the server.
pub struct ServerConnection {
    write_half: OwnedWriteHalf,
}

impl ServerConnection {
    /// Connects to `addr` and starts the background read task.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectFailed`] if the TCP connect fails.
    pub async fn connect(
        addr: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ServerEvent>), ClientError> {
        let stream =
            TcpStream::connect(addr)
                .await
                .map_err(|source| ClientError::ConnectFailed {
                    addr: addr.to_string(),
                    source,
                })?;
        let (read_half, write_half) = stream.into_split();

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(read_loop(read_half, tx));

        Ok((Self { write_half }, rx))
    }

    /// Encodes and sends one message.
    pub async fn send(&mut self, msg: &Message) -> Result<(), ClientError> {
        self.write_half.write_all(&encode_message(msg)).await?;
        Ok(())
    }

    /// Runs the Init/password handshake and returns the assigned identity.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] when the server answers with an
    /// Error frame (wrong password), and [`ClientError::Closed`] if the
    /// connection drops mid-handshake.
    pub async fn authenticate(
        &mut self,
        events: &mut mpsc::UnboundedReceiver<ServerEvent>,
        password: &str,
    ) -> Result<PlayerId, ClientError> {
        self.send(&Message::Init).await?;
        match next_message(events).await? {
            Message::Init => {}
            other => return Err(ClientError::UnexpectedReply(other)),
        }

        self.send(&Message::PasswordResponse(password.to_string()))
            .await?;
        match next_message(events).await? {
            Message::AssignId(id) => Ok(id),
            Message::Error(reason) => Err(ClientError::Rejected(reason)),
            other => Err(ClientError::UnexpectedReply(other)),
        }
    }
}

async fn next_message(
    events: &mut mpsc::UnboundedReceiver<ServerEvent>,
) -> Result<Message, ClientError> {
    match events.recv().await {
        Some(ServerEvent::Message(msg)) => Ok(msg),
        Some(ServerEvent::Disconnected) | None => Err(ClientError::Closed),
    }
}

/// Reads chunks from the server, decodes them, and forwards the messages.
async fn read_loop(
    mut reader: tokio::net::tcp::OwnedReadHalf,
    tx: mpsc::UnboundedSender<ServerEvent>,
) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("server closed the connection");
                break;
            }
            Ok(n) => match decode_message(&buf[..n]) {
                Ok(msg) => {
                    if tx.send(ServerEvent::Message(msg)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to decode inbound message");
                }
            },
            Err(e) => {
                debug!(error = %e, "read error");
                break;
            }
        }
    }
    let _ = tx.send(ServerEvent::Disconnected);
}
