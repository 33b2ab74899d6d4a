//! Per-connection session plumbing and the session registry.
//!
//! Each accepted TCP stream gets a reader task and a writer task. The reader
//! decodes frames into [`ClientMessage`] intents and forwards them to the
//! tick loop's event queue; it never touches world state itself. The writer
//! drains a bounded outbound queue of pre-encoded frames. A slow consumer
//! fills its queue and loses frames; it never stalls the tick loop.

use crate::network::ServerEvent;
use log::{debug, info, warn};
use shared::{decode_message, ClientMessage, MAX_FRAME_LEN};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Outbound frames buffered per connection before the broadcast path starts
/// dropping. At 60 snapshots a second this is about a second of backlog.
const OUTBOUND_QUEUE: usize = 64;

/// Handle to one live connection, owned by the tick loop via the registry.
#[derive(Debug)]
pub struct Session {
    pub id: u32,
    pub addr: SocketAddr,
    outbound: mpsc::Sender<Vec<u8>>,
}

impl Session {
    /// Queues a frame for delivery. Dropping on a full queue is the
    /// at-most-once contract: the next tick's snapshot supersedes this one
    /// anyway.
    pub fn send(&self, frame: Vec<u8>) {
        match self.outbound.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("client {}: outbound queue full, dropping frame", self.id);
            }
            Err(TrySendError::Closed(_)) => {
                // Writer already gone; the reader will report the disconnect.
                debug!("client {}: outbound channel closed", self.id);
            }
        }
    }
}

/// All live sessions keyed by connection id. Mutated only from the tick
/// loop's task, so no locking. Display names deliberately play no part in
/// keying; identity is the per-connection id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<u32, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    pub fn insert(&mut self, session: Session) {
        info!("client {} connected from {}", session.id, session.addr);
        self.sessions.insert(session.id, session);
    }

    pub fn remove(&mut self, id: u32) -> bool {
        if let Some(session) = self.sessions.remove(&id) {
            info!("client {} disconnected", session.id);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Queues the same frame on every session.
    pub fn broadcast(&self, frame: &[u8]) {
        for session in self.sessions.values() {
            session.send(frame.to_vec());
        }
    }
}

/// Splits the stream and spawns the reader/writer pair for one connection.
/// The returned session handle is the only way to reach the writer.
pub fn spawn(
    id: u32,
    addr: SocketAddr,
    stream: TcpStream,
    events: mpsc::UnboundedSender<ServerEvent>,
) -> Session {
    let (read_half, write_half) = stream.into_split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<Vec<u8>>(OUTBOUND_QUEUE);

    tokio::spawn(write_loop(id, write_half, outbound_rx));
    tokio::spawn(read_loop(id, read_half, events));

    Session {
        id,
        addr,
        outbound: outbound_tx,
    }
}

/// Reads one length-prefixed frame. `Ok(None)` is a clean EOF before a new
/// frame; an EOF mid-frame or an implausible length is an error because the
/// stream can no longer be trusted to be in sync.
pub async fn read_frame(stream: &mut OwnedReadHalf) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame length {} exceeds cap", len),
        ));
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Decodes inbound frames and forwards intents to the tick loop. A frame
/// that fails to decode is skipped; the connection survives. Any read error
/// or EOF ends the session with a single disconnect event.
async fn read_loop(id: u32, mut read_half: OwnedReadHalf, events: mpsc::UnboundedSender<ServerEvent>) {
    loop {
        match read_frame(&mut read_half).await {
            Ok(Some(payload)) => match decode_message::<ClientMessage>(&payload) {
                Ok(message) => {
                    if events.send(ServerEvent::Intent { id, message }).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("client {}: ignoring malformed message: {}", id, e);
                }
            },
            Ok(None) => {
                debug!("client {} closed the connection", id);
                break;
            }
            Err(e) => {
                warn!("client {}: read error: {}", id, e);
                break;
            }
        }
    }

    let _ = events.send(ServerEvent::Disconnected { id });
}

/// Writes queued frames until the session handle is dropped or the peer
/// stops accepting bytes.
async fn write_loop(id: u32, mut write_half: OwnedWriteHalf, mut outbound: mpsc::Receiver<Vec<u8>>) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = write_half.write_all(&frame).await {
            debug!("client {}: write error: {}", id, e);
            break;
        }
    }
}
