//! TCP listener and per-connection pumps.
//!
//! Architecture:
//! - [`serve`] accepts connections and gives each a process-unique
//!   [`ConnectionKey`].
//! - Each connection gets a reader task (this module) and a writer task that
//!   drains the connection's outbound channel to the socket.
//! - The reader pulls one chunk at a time and hands it to the engine while
//!   holding the engine lock, so a message is processed atomically with
//!   respect to every other connection.
//!
//! The protocol has no uniform length header; one read chunk is one message,
//! as in the original wire contract.  TCP ordering within a connection is the
//! only ordering relied upon.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use crate::application::engine::{ConnectionKey, Disposition, Engine};
use crate::application::registry::OutboundHandle;

/// Errors that can occur while standing the listener up.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Upper bound on one inbound chunk.  Comfortably larger than any message the
/// terminal client produces.
const READ_BUFFER_SIZE: usize = 4096;

/// Keys for accepted connections; distinct from player identities, which the
/// engine assigns only after authentication.
static NEXT_CONNECTION_KEY: AtomicU64 = AtomicU64::new(1);

fn next_connection_key() -> ConnectionKey {
    NEXT_CONNECTION_KEY.fetch_add(1, Ordering::Relaxed)
}

/// Binds the listener on `addr`.
pub async fn bind(addr: &str) -> Result<TcpListener, NetworkError> {
    TcpListener::bind(addr).await.map_err(|source| NetworkError::BindFailed {
        addr: addr.to_string(),
        source,
    })
}

/// Runs the accept loop until the process is terminated.
///
/// Each accepted connection is served by its own task; a failed accept is
/// logged and the loop continues.
pub async fn serve(listener: TcpListener, engine: Arc<Mutex<Engine>>) -> std::io::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let key = next_connection_key();
                info!(key, %peer, "accepted connection");
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    handle_connection(stream, key, engine).await;
                });
            }
            Err(e) => {
                error!(error = %e, "accept failed");
            }
        }
    }
}

/// Serves a single connection from accept to close.
async fn handle_connection(stream: TcpStream, key: ConnectionKey, engine: Arc<Mutex<Engine>>) {
    let (mut read_half, mut write_half) = stream.into_split();

    // The engine queues encoded frames here; the writer task drains them.
    let (tx, mut outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = write_half.write_all(&frame).await {
                debug!(error = %e, "write failed; stopping writer");
                break;
            }
        }
    });

    {
        let mut engine = engine.lock().await;
        engine.connect(key, OutboundHandle::new(tx));
    }

    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        match read_half.read(&mut buf).await {
            Ok(0) => {
                debug!(key, "peer closed the connection");
                break;
            }
            Ok(n) => {
                let disposition = {
                    let mut engine = engine.lock().await;
                    engine.handle_chunk(key, &buf[..n])
                };
                if disposition == Disposition::Close {
                    break;
                }
            }
            Err(e) => {
                debug!(key, error = %e, "read error");
                break;
            }
        }
    }

    {
        let mut engine = engine.lock().await;
        engine.disconnect(key);
    }

    // Dropping the engine's handle closed the channel; the writer exits after
    // flushing whatever is still queued (e.g. the final Error frame).
    let _ = writer.await;
    debug!(key, "connection task finished");
}
