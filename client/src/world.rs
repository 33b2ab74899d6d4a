//! Client-side presentation state.
//!
//! These records mirror the authoritative world for rendering and are
//! rebuilt wholesale from each snapshot; nothing here feeds back into the
//! simulation. The local player is the exception: its position is owned
//! locally and reported to the server, and its economy is the shop's local
//! ledger, untouched by snapshots.

use shared::collision::beam_end_point;
use shared::{Color, WorldSnapshot, CULL_WINDOW, GREEN, LASER_COST, PROJECTILE_SPEED};

/// The player this client controls. Position is authoritative here and
/// trusted verbatim by the server.
#[derive(Debug, Clone)]
pub struct LocalPlayer {
    pub x: f32,
    pub y: f32,
    pub name: String,
    pub health: i32,
    pub money: u32,
    pub has_laser_beam: bool,
}

impl Default for LocalPlayer {
    fn default() -> Self {
        Self::new("")
    }
}

impl LocalPlayer {
    pub fn new(name: &str) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            name: name.to_string(),
            health: 100,
            money: 0,
            has_laser_beam: false,
        }
    }

    /// Shop purchase of the laser entitlement. Local-only: the server never
    /// learns of the purchase and keeps trusting fire intents regardless
    /// (see DESIGN.md).
    pub fn purchase_laser(&mut self) -> bool {
        if self.has_laser_beam || self.money < LASER_COST {
            return false;
        }
        self.money -= LASER_COST;
        self.has_laser_beam = true;
        true
    }
}

/// Another connected player as last reported by the server.
#[derive(Debug, Clone)]
pub struct RemotePlayer {
    pub x: f32,
    pub y: f32,
    pub name: String,
    pub money: u32,
    pub has_laser_beam: bool,
    pub health: i32,
}

#[derive(Debug, Clone)]
pub struct EnemyMirror {
    pub x: f32,
    pub y: f32,
    pub color: Color,
    pub health: i32,
}

impl Default for EnemyMirror {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            color: GREEN,
            health: 100,
        }
    }
}

/// A projectile somebody else fired, positioned by the server.
#[derive(Debug, Clone)]
pub struct ProjectileMirror {
    pub x: f32,
    pub y: f32,
}

/// A shot this client fired, integrated locally between snapshots so it
/// tracks smoothly instead of waiting on the broadcast.
#[derive(Debug, Clone)]
pub struct OwnProjectile {
    pub x: f32,
    pub y: f32,
    pub velocity: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct BeamMirror {
    pub start_point: [f32; 2],
    pub end_point: [f32; 2],
    pub angle: f32,
}

#[derive(Debug, Clone)]
pub struct ChatLine {
    pub sender: String,
    pub message: String,
}

/// Everything a renderer needs, kept current by [`apply_snapshot`] and
/// [`apply_chat`].
///
/// [`apply_snapshot`]: ClientWorld::apply_snapshot
/// [`apply_chat`]: ClientWorld::apply_chat
#[derive(Debug, Default)]
pub struct ClientWorld {
    pub local: LocalPlayer,
    pub players: Vec<RemotePlayer>,
    pub enemy: EnemyMirror,
    pub projectiles: Vec<ProjectileMirror>,
    pub own_projectiles: Vec<OwnProjectile>,
    pub laser_beams: Vec<BeamMirror>,
    pub chat_log: Vec<ChatLine>,
}

impl ClientWorld {
    pub fn new(name: &str) -> Self {
        Self {
            local: LocalPlayer::new(name),
            ..Self::default()
        }
    }

    /// Replaces every mirror with the snapshot's contents. The local
    /// player's own projectiles come from local state, so the server's copy
    /// of them is dropped here.
    pub fn apply_snapshot(&mut self, snapshot: WorldSnapshot) {
        self.players = snapshot
            .players
            .into_iter()
            .map(|player| RemotePlayer {
                x: player.x,
                y: player.y,
                name: player.name,
                money: player.money,
                has_laser_beam: player.has_laser_beam,
                health: player.health,
            })
            .collect();

        self.enemy = EnemyMirror {
            x: snapshot.enemy.x,
            y: snapshot.enemy.y,
            color: snapshot.enemy.color,
            health: snapshot.enemy.health,
        };

        self.projectiles = snapshot
            .projectiles
            .into_iter()
            .filter(|projectile| projectile.name != self.local.name)
            .map(|projectile| ProjectileMirror {
                x: projectile.x,
                y: projectile.y,
            })
            .collect();

        self.laser_beams = snapshot
            .laser_beams
            .into_iter()
            .map(|beam| BeamMirror {
                start_point: beam.start_point,
                end_point: beam_end_point(beam.start_point, beam.angle),
                angle: beam.angle,
            })
            .collect();
    }

    /// Appends a relayed chat line. The server already excludes the sender,
    /// but the local echo is filtered again in case two clients share a
    /// name.
    pub fn apply_chat(&mut self, message: String, sender: String) {
        if sender != self.local.name {
            self.chat_log.push(ChatLine { sender, message });
        }
    }

    /// Registers a locally fired shot and returns its velocity for the
    /// outgoing intent.
    pub fn fire_projectile(&mut self, angle: f32) -> [f32; 2] {
        let velocity = aim_velocity(angle);
        self.own_projectiles.push(OwnProjectile {
            x: self.local.x,
            y: self.local.y,
            velocity,
        });
        velocity
    }

    /// Cosmetic integration of the client's own shots between snapshots,
    /// with the same cull window the server applies.
    pub fn advance(&mut self, dt: f32) {
        for projectile in &mut self.own_projectiles {
            projectile.x += projectile.velocity[0] * dt;
            projectile.y += projectile.velocity[1] * dt;
        }

        let (ax, ay) = (self.local.x, self.local.y);
        self.own_projectiles.retain(|projectile| {
            (projectile.x - ax).abs() <= CULL_WINDOW && (projectile.y - ay).abs() <= CULL_WINDOW
        });
    }
}

/// Velocity of a shot fired at `angle` radians, at the fixed projectile
/// speed.
pub fn aim_velocity(angle: f32) -> [f32; 2] {
    [
        angle.cos() * PROJECTILE_SPEED,
        angle.sin() * PROJECTILE_SPEED,
    ]
}
