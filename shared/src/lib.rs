//! Types and math shared between the authoritative server and its clients:
//! gameplay constants, the wire message schema, and the collision tests both
//! sides agree on.

pub mod collision;
pub mod protocol;

pub use protocol::{
    decode_message, encode_frame, ClientMessage, EnemyState, LaserBeamState, PlayerState,
    ProjectileState, ServerMessage, WorldSnapshot, MAX_FRAME_LEN,
};

/// Edge length of a player's axis-aligned collision box.
pub const PLAYER_SIZE: f32 = 100.0;
/// Edge length of the enemy's collision box, also the laser hit radius.
pub const ENEMY_SIZE: f32 = 100.0;
pub const PLAYER_SPEED: f32 = 300.0;
pub const ENEMY_SPEED: f32 = 100.0;

pub const PROJECTILE_DAMAGE: i32 = 10;
pub const LASER_DAMAGE: i32 = 30;
pub const PROJECTILE_SPEED: f32 = 400.0;

/// A beam extends this far from its start point along its angle.
pub const LASER_RANGE: f32 = 1000.0;
/// Seconds a beam stays alive before it is removed.
pub const LASER_FADE_DURATION: f32 = 0.5;

/// Ticks the enemy signals the hit state after taking damage.
pub const HIT_STUN_TICKS: u32 = 30;
/// Per-tick probability that the enemy fires at the nearest player.
pub const ENEMY_FIRE_CHANCE: f64 = 0.01;
/// Half-width of the square around the tracking player that respawn
/// placement must avoid (the client's minimap coverage).
pub const MINIMAP_RADIUS: f32 = 100.0;
/// Respawn positions are sampled within this offset of the tracking player.
pub const RESPAWN_WINDOW: i32 = 1000;

pub const KILL_REWARD: u32 = 100;
pub const LASER_COST: u32 = 500;

/// Projectiles farther than this from the reference player on either axis
/// are dropped.
pub const CULL_WINDOW: f32 = 1000.0;

/// Owner tag carried by enemy-fired projectiles.
pub const ENEMY_OWNER: &str = "enemy";

pub const DEFAULT_PORT: u16 = 12345;

pub type Color = [u8; 3];

pub const RED: Color = [255, 0, 0];
pub const GREEN: Color = [0, 255, 0];
