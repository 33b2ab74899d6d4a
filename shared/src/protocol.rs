//! Wire message schema and framing.
//!
//! Messages travel over a persistent TCP stream as bincode payloads behind a
//! 4-byte big-endian length prefix. Both directions use the same framing;
//! the message enums differ per direction.

use crate::Color;
use serde::{Deserialize, Serialize};

/// Upper bound on a single frame's payload. A peer announcing more than this
/// is no longer speaking the protocol and the stream cannot be resynced.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Intents submitted by a client. The server trusts these verbatim; there is
/// no movement or fire-rate validation (see DESIGN.md).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum ClientMessage {
    Move {
        x: f32,
        y: f32,
        name: String,
    },
    Projectile {
        x: f32,
        y: f32,
        velocity: [f32; 2],
        name: String,
    },
    LaserBeam {
        x: f32,
        y: f32,
        angle: f32,
        name: String,
    },
    Chat {
        message: String,
        sender: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum ServerMessage {
    GameState { data: WorldSnapshot },
    Chat { message: String, sender: String },
}

/// Full world state broadcast to every client once per tick.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WorldSnapshot {
    pub players: Vec<PlayerState>,
    pub enemy: EnemyState,
    pub projectiles: Vec<ProjectileState>,
    pub laser_beams: Vec<LaserBeamState>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub money: u32,
    pub has_laser_beam: bool,
    pub name: String,
    pub health: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EnemyState {
    pub x: f32,
    pub y: f32,
    pub color: Color,
    pub health: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProjectileState {
    pub x: f32,
    pub y: f32,
    /// Owner tag: a player name or [`crate::ENEMY_OWNER`].
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LaserBeamState {
    pub start_point: [f32; 2],
    pub angle: f32,
}

/// Serializes a message and prepends the length prefix, producing bytes
/// ready to be written to the stream in one piece.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, bincode::Error> {
    let payload = bincode::serialize(message)?;
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes one frame payload (without the length prefix). A failure means
/// the message is malformed and should be skipped, not that the stream is
/// broken.
pub fn decode_message<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> Result<T, bincode::Error> {
    bincode::deserialize(payload)
}
