//! Framed TCP connection to the server: outgoing intents, incoming
//! snapshot/chat application, and the headless drive loop.

use crate::world::ClientWorld;
use log::{debug, info, warn};
use shared::{decode_message, encode_frame, ClientMessage, ServerMessage, MAX_FRAME_LEN};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{Duration, Instant};

/// Cadence for reporting the local position, mirroring the 60 Hz frame
/// loop of a rendering client.
const MOVE_INTERVAL: Duration = Duration::from_millis(16);

pub struct Client {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    pub world: ClientWorld,
}

impl Client {
    pub async fn connect(server_addr: &str, name: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();

        info!("Connected to {}", server_addr);

        Ok(Client {
            reader,
            writer,
            world: ClientWorld::new(name),
        })
    }

    async fn send(&mut self, message: &ClientMessage) -> io::Result<()> {
        let frame = encode_frame(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(&frame).await
    }

    /// Reports the local position. The first call also claims the display
    /// name and puts this client in the roster.
    pub async fn send_move(&mut self) -> io::Result<()> {
        let message = ClientMessage::Move {
            x: self.world.local.x,
            y: self.world.local.y,
            name: self.world.local.name.clone(),
        };
        self.send(&message).await
    }

    /// Fires a projectile at `angle` radians from the local position.
    pub async fn send_projectile(&mut self, angle: f32) -> io::Result<()> {
        let velocity = self.world.fire_projectile(angle);
        let message = ClientMessage::Projectile {
            x: self.world.local.x,
            y: self.world.local.y,
            velocity,
            name: self.world.local.name.clone(),
        };
        self.send(&message).await
    }

    /// Fires the laser if the entitlement has been purchased. Returns
    /// whether anything was sent; the gate is client-side only, the server
    /// does not re-check it.
    pub async fn send_laser(&mut self, angle: f32) -> io::Result<bool> {
        if !self.world.local.has_laser_beam {
            debug!("laser not purchased, ignoring fire request");
            return Ok(false);
        }

        let message = ClientMessage::LaserBeam {
            x: self.world.local.x,
            y: self.world.local.y,
            angle,
            name: self.world.local.name.clone(),
        };
        self.send(&message).await?;
        Ok(true)
    }

    pub async fn send_chat(&mut self, text: &str) -> io::Result<()> {
        let message = ClientMessage::Chat {
            message: text.to_string(),
            sender: self.world.local.name.clone(),
        };
        self.send(&message).await
    }

    /// Reads server messages until one decodes, skipping malformed frames.
    /// `Ok(None)` means the server closed the connection.
    pub async fn recv(&mut self) -> io::Result<Option<ServerMessage>> {
        loop {
            match read_frame(&mut self.reader).await? {
                Some(payload) => match decode_message::<ServerMessage>(&payload) {
                    Ok(message) => return Ok(Some(message)),
                    Err(e) => warn!("ignoring malformed server message: {}", e),
                },
                None => return Ok(None),
            }
        }
    }

    /// Applies one server message to the presentation state.
    pub fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::GameState { data } => self.world.apply_snapshot(data),
            ServerMessage::Chat { message, sender } => self.world.apply_chat(message, sender),
        }
    }

    /// Headless drive loop: claims the name, then applies every inbound
    /// message and keeps reporting the position at the move cadence. The
    /// loop is paced by the server's broadcast stream, which arrives at the
    /// tick rate once this client is in the roster.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.send_move().await?;
        let mut last_move = Instant::now();
        let mut snapshots: u64 = 0;

        loop {
            match self.recv().await? {
                Some(message) => {
                    if let ServerMessage::Chat { sender, message } = &message {
                        info!("[chat] {}: {}", sender, message);
                    }
                    if let ServerMessage::GameState { .. } = &message {
                        snapshots += 1;
                        if snapshots % 600 == 0 {
                            debug!(
                                "{} snapshots received, {} players in world",
                                snapshots,
                                self.world.players.len()
                            );
                        }
                    }

                    self.apply(message);

                    let elapsed = last_move.elapsed();
                    if elapsed >= MOVE_INTERVAL {
                        self.world.advance(elapsed.as_secs_f32());
                        self.send_move().await?;
                        last_move = Instant::now();
                    }
                }
                None => {
                    info!("Server closed the connection");
                    return Ok(());
                }
            }
        }
    }
}

/// Reads one length-prefixed frame; `Ok(None)` is a clean EOF before a new
/// frame.
async fn read_frame(reader: &mut OwnedReadHalf) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
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
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}
