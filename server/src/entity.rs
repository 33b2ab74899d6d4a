//! Authoritative entity records. These are the server's ground truth; the
//! client crate keeps its own presentation mirrors rebuilt from snapshots.

use rand::Rng;
use shared::collision::{beam_end_point, beam_hits_point};
use shared::{
    Color, ENEMY_SIZE, ENEMY_SPEED, GREEN, HIT_STUN_TICKS, LASER_DAMAGE, LASER_FADE_DURATION,
    MINIMAP_RADIUS, PLAYER_SIZE, PROJECTILE_DAMAGE, RED, RESPAWN_WINDOW,
};

/// One connected player's authoritative state. Created as a blank record at
/// connection accept; the first `Move` intent claims the display name.
#[derive(Debug, Clone)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub name: String,
    pub health: i32,
    pub money: u32,
    pub has_laser_beam: bool,
    pub size: f32,
}

impl Player {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            name: String::new(),
            health: 100,
            money: 0,
            has_laser_beam: false,
            size: PLAYER_SIZE,
        }
    }

    pub fn award(&mut self, amount: u32) {
        self.money += amount;
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// The single shared NPC. Its color doubles as the hit-stun signal: green is
/// neutral, red means recently hit and immune to projectile damage.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub color: Color,
    pub health: i32,
    pub hit_timer: u32,
    pub minimap_radius: f32,
    pub speed: f32,
    pub size: f32,
}

impl Enemy {
    /// Initial spawn at server start, uniformly within ±400 of the origin.
    pub fn spawn(rng: &mut impl Rng) -> Self {
        Self {
            x: rng.gen_range(-400..=400) as f32,
            y: rng.gen_range(-400..=400) as f32,
            color: GREEN,
            health: 100,
            hit_timer: 0,
            minimap_radius: MINIMAP_RADIUS,
            speed: ENEMY_SPEED,
            size: ENEMY_SIZE,
        }
    }

    /// Per-axis nudge toward the target by `speed * dt`. There is no
    /// overshoot guard; at large dt the enemy oscillates past the target,
    /// which is acceptable at the fixed 60 Hz tick.
    pub fn advance_toward(&mut self, dt: f32, target: (f32, f32)) {
        if self.x < target.0 {
            self.x += self.speed * dt;
        } else if self.x > target.0 {
            self.x -= self.speed * dt;
        }
        if self.y < target.1 {
            self.y += self.speed * dt;
        } else if self.y > target.1 {
            self.y -= self.speed * dt;
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    /// While the hit color is showing, player projectiles pass through.
    pub fn is_stunned(&self) -> bool {
        self.color == RED
    }

    pub fn hit_projectile(&mut self) {
        self.health -= PROJECTILE_DAMAGE;
        self.hit_timer = HIT_STUN_TICKS;
        self.color = RED;
    }

    pub fn hit_laser(&mut self) {
        self.health -= LASER_DAMAGE;
        self.hit_timer = HIT_STUN_TICKS;
        self.color = RED;
    }

    /// Re-places the enemy after a kill: rejection-samples offsets within
    /// ±[`RESPAWN_WINDOW`] of the tracking player until the position falls
    /// strictly outside the minimap square centered on that player. The loop
    /// has no iteration cap; with the shipped constants the exclusion zone
    /// covers about 1% of the sampling window, so it terminates almost
    /// surely.
    pub fn respawn(&mut self, rng: &mut impl Rng, anchor: (f32, f32)) {
        let minimap_left = anchor.0 - self.minimap_radius;
        let minimap_right = anchor.0 + self.minimap_radius;
        let minimap_top = anchor.1 - self.minimap_radius;
        let minimap_bottom = anchor.1 + self.minimap_radius;

        loop {
            self.x = anchor.0 + rng.gen_range(-RESPAWN_WINDOW..=RESPAWN_WINDOW) as f32;
            self.y = anchor.1 + rng.gen_range(-RESPAWN_WINDOW..=RESPAWN_WINDOW) as f32;

            if self.x < minimap_left
                || self.x > minimap_right
                || self.y < minimap_top
                || self.y > minimap_bottom
            {
                break;
            }
        }

        self.color = GREEN;
        self.health = 100;
        self.hit_timer = 0;
    }

    /// Counts down the hit-stun timer, reverting the color to neutral on the
    /// tick the timer reaches zero.
    pub fn update(&mut self) {
        if self.hit_timer > 0 {
            self.hit_timer -= 1;
            if self.hit_timer == 0 {
                self.color = GREEN;
            }
        }
    }
}

/// A fired shot. Ephemeral: removed on its first hit or when it drifts out
/// of the cull window around the reference player.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    pub velocity: [f32; 2],
    pub owner: String,
}

impl Projectile {
    pub fn new(x: f32, y: f32, velocity: [f32; 2], owner: String) -> Self {
        Self {
            x,
            y,
            velocity,
            owner,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.x += self.velocity[0] * dt;
        self.y += self.velocity[1] * dt;
    }
}

/// A beam shot. Lives for [`LASER_FADE_DURATION`] seconds and damages the
/// enemy on every tick it overlaps, hit-stun notwithstanding.
#[derive(Debug, Clone)]
pub struct LaserBeam {
    pub start_point: [f32; 2],
    pub end_point: [f32; 2],
    pub angle: f32,
    pub age: f32,
}

impl LaserBeam {
    pub fn new(x: f32, y: f32, angle: f32) -> Self {
        let start_point = [x, y];
        Self {
            start_point,
            end_point: beam_end_point(start_point, angle),
            angle,
            age: 0.0,
        }
    }

    pub fn fade(&mut self, dt: f32) {
        self.age += dt;
    }

    pub fn is_faded(&self) -> bool {
        self.age > LASER_FADE_DURATION
    }

    pub fn hits(&self, point: (f32, f32), threshold: f32) -> bool {
        beam_hits_point(
            self.start_point,
            self.end_point,
            [point.0, point.1],
            threshold,
        )
    }
}
