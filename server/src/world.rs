//! Authoritative world state and the per-tick simulation.
//!
//! One `World` exists per server process and is only ever touched from the
//! tick loop, so nothing in here locks. Players are keyed by their
//! connection id; a separate join-order list preserves roster order, which
//! the kill-credit, respawn-anchor, and cull rules all key off.

use crate::entity::{Enemy, LaserBeam, Player, Projectile};
use log::{debug, info};
use rand::Rng;
use shared::collision::point_in_box;
use shared::{
    EnemyState, LaserBeamState, PlayerState, ProjectileState, WorldSnapshot, CULL_WINDOW,
    ENEMY_FIRE_CHANCE, ENEMY_OWNER, ENEMY_SIZE, KILL_REWARD, PROJECTILE_DAMAGE, PROJECTILE_SPEED,
};
use std::collections::HashMap;

pub struct World {
    pub tick: u64,
    players: HashMap<u32, Player>,
    join_order: Vec<u32>,
    pub enemy: Enemy,
    pub projectiles: Vec<Projectile>,
    pub laser_beams: Vec<LaserBeam>,
}

impl World {
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            tick: 0,
            players: HashMap::new(),
            join_order: Vec::new(),
            enemy: Enemy::spawn(rng),
            projectiles: Vec::new(),
            laser_beams: Vec::new(),
        }
    }

    /// Registers a blank player record for a newly accepted connection. The
    /// display name stays empty until the first `Move` intent claims it.
    pub fn add_player(&mut self, id: u32) {
        if self.players.insert(id, Player::new()).is_none() {
            self.join_order.push(id);
            info!("player {} joined the roster", id);
        }
    }

    pub fn remove_player(&mut self, id: u32) {
        if self.players.remove(&id).is_some() {
            self.join_order.retain(|&other| other != id);
            info!("player {} left the roster", id);
        }
    }

    pub fn player_count(&self) -> usize {
        self.join_order.len()
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_name(&self, id: u32) -> Option<&str> {
        self.players.get(&id).map(|player| player.name.as_str())
    }

    /// Position and name are applied verbatim. There is no plausibility
    /// check against the previous position, a known trust gap kept for
    /// protocol compatibility (see DESIGN.md).
    pub fn apply_move(&mut self, id: u32, x: f32, y: f32, name: String) {
        if let Some(player) = self.players.get_mut(&id) {
            player.x = x;
            player.y = y;
            player.name = name;
        }
    }

    pub fn spawn_projectile(&mut self, x: f32, y: f32, velocity: [f32; 2], owner: String) {
        self.projectiles.push(Projectile::new(x, y, velocity, owner));
    }

    pub fn spawn_laser(&mut self, x: f32, y: f32, angle: f32) {
        self.laser_beams.push(LaserBeam::new(x, y, angle));
    }

    /// Advances the world by one tick. With an empty roster the whole tick
    /// is skipped, enemy and projectiles included; the world freezes until
    /// someone connects.
    pub fn step(&mut self, dt: f32, rng: &mut impl Rng) {
        let target = match self.nearest_player_position() {
            Some(position) => position,
            None => return,
        };

        self.enemy.advance_toward(dt, target);

        if rng.gen_bool(ENEMY_FIRE_CHANCE) {
            self.enemy_fire(target);
        }

        self.integrate_projectiles(dt, rng);
        self.integrate_laser_beams(dt, rng);
        self.enemy.update();
        self.cull_projectiles();

        self.tick += 1;
    }

    /// Full world state for this tick's broadcast, players in roster order.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            players: self
                .join_order
                .iter()
                .filter_map(|id| self.players.get(id))
                .map(|player| PlayerState {
                    x: player.x,
                    y: player.y,
                    money: player.money,
                    has_laser_beam: player.has_laser_beam,
                    name: player.name.clone(),
                    health: player.health,
                })
                .collect(),
            enemy: EnemyState {
                x: self.enemy.x,
                y: self.enemy.y,
                color: self.enemy.color,
                health: self.enemy.health,
            },
            projectiles: self
                .projectiles
                .iter()
                .map(|projectile| ProjectileState {
                    x: projectile.x,
                    y: projectile.y,
                    name: projectile.owner.clone(),
                })
                .collect(),
            laser_beams: self
                .laser_beams
                .iter()
                .map(|beam| LaserBeamState {
                    start_point: beam.start_point,
                    angle: beam.angle,
                })
                .collect(),
        }
    }

    /// Nearest connected player to the enemy; ties go to the earlier roster
    /// entry.
    fn nearest_player_position(&self) -> Option<(f32, f32)> {
        let mut best: Option<(f32, (f32, f32))> = None;
        for id in &self.join_order {
            if let Some(player) = self.players.get(id) {
                let dx = player.x - self.enemy.x;
                let dy = player.y - self.enemy.y;
                let distance_sq = dx * dx + dy * dy;
                let closer = match best {
                    Some((best_sq, _)) => distance_sq < best_sq,
                    None => true,
                };
                if closer {
                    best = Some((distance_sq, (player.x, player.y)));
                }
            }
        }
        best.map(|(_, position)| position)
    }

    fn enemy_fire(&mut self, target: (f32, f32)) {
        let angle = (target.1 - self.enemy.y).atan2(target.0 - self.enemy.x);
        let velocity = [
            angle.cos() * PROJECTILE_SPEED,
            angle.sin() * PROJECTILE_SPEED,
        ];
        let (cx, cy) = self.enemy.center();
        debug!("enemy fires from ({:.0}, {:.0})", cx, cy);
        self.projectiles
            .push(Projectile::new(cx, cy, velocity, ENEMY_OWNER.to_string()));
    }

    fn integrate_projectiles(&mut self, dt: f32, rng: &mut impl Rng) {
        let mut i = 0;
        while i < self.projectiles.len() {
            self.projectiles[i].advance(dt);
            let px = self.projectiles[i].x;
            let py = self.projectiles[i].y;

            let hit = if self.projectiles[i].owner == ENEMY_OWNER {
                self.damage_first_player_hit(px, py)
            } else if !self.enemy.is_stunned()
                && point_in_box(px, py, self.enemy.x, self.enemy.y, self.enemy.size)
            {
                self.enemy.hit_projectile();
                self.resolve_enemy_death(rng);
                true
            } else {
                false
            };

            if hit {
                self.projectiles.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// First box hit in roster order takes the damage; a projectile never
    /// damages two players even when boxes overlap.
    fn damage_first_player_hit(&mut self, px: f32, py: f32) -> bool {
        for id in &self.join_order {
            if let Some(player) = self.players.get_mut(id) {
                if point_in_box(px, py, player.x, player.y, player.size) {
                    player.health -= PROJECTILE_DAMAGE;
                    return true;
                }
            }
        }
        false
    }

    /// Beams damage on every tick they overlap the enemy's position, and
    /// unlike projectiles they ignore the hit-stun window. The test point is
    /// the enemy's corner, not its center, matching the shipped client.
    fn integrate_laser_beams(&mut self, dt: f32, rng: &mut impl Rng) {
        let mut i = 0;
        while i < self.laser_beams.len() {
            self.laser_beams[i].fade(dt);

            if self.laser_beams[i].hits((self.enemy.x, self.enemy.y), ENEMY_SIZE) {
                self.enemy.hit_laser();
                self.resolve_enemy_death(rng);
            }

            if self.laser_beams[i].is_faded() {
                self.laser_beams.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Applies the kill outcome if the last hit dropped the enemy's health
    /// to zero or below. The first roster entry is credited and anchors the
    /// respawn, whether or not it fired the shot; every caller checks death
    /// immediately after its own hit, so one kill resolves exactly once.
    fn resolve_enemy_death(&mut self, rng: &mut impl Rng) {
        if self.enemy.health > 0 {
            return;
        }
        if let Some(first) = self.join_order.first().copied() {
            if let Some(player) = self.players.get_mut(&first) {
                player.award(KILL_REWARD);
                info!(
                    "enemy killed, {} credited to '{}' (player {})",
                    KILL_REWARD, player.name, first
                );
                let anchor = (player.x, player.y);
                self.enemy.respawn(rng, anchor);
            }
        }
    }

    /// Drops projectiles outside the window around the first roster entry.
    fn cull_projectiles(&mut self) {
        if let Some(first) = self.join_order.first().copied() {
            if let Some(player) = self.players.get(&first) {
                let (ax, ay) = (player.x, player.y);
                self.projectiles.retain(|projectile| {
                    (projectile.x - ax).abs() <= CULL_WINDOW
                        && (projectile.y - ay).abs() <= CULL_WINDOW
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{GREEN, LASER_DAMAGE, RED};

    const DT: f32 = 1.0 / 60.0;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Counts projectiles that were not fired by the enemy; the enemy's
    /// probabilistic fire can add its own during `step`.
    fn player_projectiles(world: &World) -> usize {
        world
            .projectiles
            .iter()
            .filter(|projectile| projectile.owner != ENEMY_OWNER)
            .count()
    }

    #[test]
    fn test_step_with_empty_roster_is_a_noop() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        let (ex, ey) = (world.enemy.x, world.enemy.y);

        world.step(DT, &mut rng);

        assert_eq!(world.tick, 0);
        assert_eq!(world.enemy.x, ex);
        assert_eq!(world.enemy.y, ey);
    }

    #[test]
    fn test_move_is_applied_verbatim() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        world.add_player(1);

        // No plausibility check: any jump is accepted.
        world.apply_move(1, 1_000_000.0, -5.0, "speedy".to_string());

        let player = world.player(1).unwrap();
        assert_eq!(player.x, 1_000_000.0);
        assert_eq!(player.y, -5.0);
        assert_eq!(player.name, "speedy");
    }

    #[test]
    fn test_snapshot_preserves_roster_order() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        for id in [3, 1, 2] {
            world.add_player(id);
        }
        world.apply_move(3, 0.0, 0.0, "c".to_string());
        world.apply_move(1, 0.0, 0.0, "a".to_string());
        world.apply_move(2, 0.0, 0.0, "b".to_string());

        let names: Vec<String> = world
            .snapshot()
            .players
            .into_iter()
            .map(|player| player.name)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        world.remove_player(3);
        let names: Vec<String> = world
            .snapshot()
            .players
            .into_iter()
            .map(|player| player.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_enemy_projectile_damages_first_overlapping_player_only() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        world.enemy.x = 5000.0;
        world.enemy.y = 5000.0;
        world.add_player(1);
        world.add_player(2);
        world.apply_move(1, 0.0, 0.0, "first".to_string());
        world.apply_move(2, 0.0, 0.0, "second".to_string());

        world.spawn_projectile(50.0, 50.0, [0.0, 0.0], ENEMY_OWNER.to_string());
        world.step(DT, &mut rng);

        assert_eq!(world.player(1).unwrap().health, 100 - PROJECTILE_DAMAGE);
        assert_eq!(world.player(2).unwrap().health, 100);
    }

    #[test]
    fn test_kill_awards_first_roster_entry_not_the_shooter() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        world.enemy.x = 0.0;
        world.enemy.y = 0.0;
        world.enemy.health = PROJECTILE_DAMAGE;
        world.add_player(1);
        world.add_player(2);
        // The first joiner sits far away; the second joiner takes the shot.
        world.apply_move(1, 100_000.0, 100_000.0, "afk".to_string());
        world.apply_move(2, 300.0, 300.0, "shooter".to_string());

        world.spawn_projectile(50.0, 50.0, [0.0, 0.0], "shooter".to_string());
        world.step(DT, &mut rng);

        let first = world.player(1).unwrap();
        let shooter = world.player(2).unwrap();
        assert_eq!(first.money, KILL_REWARD, "credit goes to the first joiner");
        assert_eq!(shooter.money, 0);
        assert_eq!(world.enemy.health, 100);
        assert_eq!(world.enemy.color, GREEN);

        // Respawn is anchored to the first joiner, outside its minimap
        // square but within the sampling window.
        let dx = world.enemy.x - first.x;
        let dy = world.enemy.y - first.y;
        assert!(dx.abs() > world.enemy.minimap_radius || dy.abs() > world.enemy.minimap_radius);
        assert!(dx.abs() <= 1000.0 && dy.abs() <= 1000.0);
    }

    #[test]
    fn test_simultaneous_hits_award_the_kill_once() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        world.enemy.x = 0.0;
        world.enemy.y = 0.0;
        world.enemy.health = PROJECTILE_DAMAGE;
        world.add_player(1);
        world.apply_move(1, 100_000.0, 100_000.0, "anchor".to_string());

        // Two projectiles overlap the enemy in the same tick. The first one
        // kills; the respawned enemy is far away, so the second misses.
        world.spawn_projectile(50.0, 50.0, [0.0, 0.0], "anchor".to_string());
        world.spawn_projectile(60.0, 60.0, [0.0, 0.0], "anchor".to_string());
        world.step(DT, &mut rng);

        assert_eq!(world.player(1).unwrap().money, KILL_REWARD);
        assert_eq!(world.enemy.health, 100);
    }

    #[test]
    fn test_stunned_enemy_ignores_player_projectiles() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        world.enemy.x = 0.0;
        world.enemy.y = 0.0;
        world.enemy.color = RED;
        world.add_player(1);
        world.apply_move(1, 0.0, 0.0, "a".to_string());

        world.spawn_projectile(50.0, 50.0, [0.0, 0.0], "a".to_string());
        world.step(DT, &mut rng);

        // No damage, and the projectile flies on instead of being consumed.
        assert_eq!(world.enemy.health, 100);
        assert_eq!(player_projectiles(&world), 1);
    }

    #[test]
    fn test_laser_damages_despite_stun_and_kills_exactly_once() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        world.enemy.x = 0.0;
        world.enemy.y = 0.0;
        world.enemy.color = RED;
        world.add_player(1);
        world.apply_move(1, 0.0, 0.0, "a".to_string());

        // Horizontal beam through the enemy's position.
        world.spawn_laser(-500.0, 0.0, 0.0);

        world.step(DT, &mut rng);
        assert_eq!(world.enemy.health, 100 - LASER_DAMAGE, "stun does not gate lasers");

        // The beam keeps damaging every tick it overlaps: 70 -> 40 -> 10,
        // then the fourth tick drives health below zero and respawns.
        world.step(DT, &mut rng);
        world.step(DT, &mut rng);
        assert_eq!(world.enemy.health, 10);

        world.step(DT, &mut rng);
        assert_eq!(world.enemy.health, 100);
        assert_eq!(world.player(1).unwrap().money, KILL_REWARD);
    }

    #[test]
    fn test_laser_beam_expires_after_fade_duration() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        world.enemy.x = 0.0;
        world.enemy.y = 0.0;
        world.add_player(1);
        world.apply_move(1, 0.0, 0.0, "a".to_string());

        // A beam that never touches the enemy.
        world.spawn_laser(5000.0, 5000.0, 0.0);

        // Well inside the fade duration the beam survives; well past it the
        // beam is gone. The exact boundary tick is left alone because the
        // age accumulates in floating point.
        for _ in 0..20 {
            world.step(DT, &mut rng);
        }
        assert_eq!(world.laser_beams.len(), 1);

        for _ in 0..20 {
            world.step(DT, &mut rng);
        }
        assert!(world.laser_beams.is_empty());
    }

    #[test]
    fn test_projectiles_culled_around_first_roster_entry() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        world.enemy.x = 0.0;
        world.enemy.y = 0.0;
        world.add_player(1);
        world.apply_move(1, 0.0, 0.0, "a".to_string());

        world.spawn_projectile(500.0, 0.0, [0.0, 0.0], "a".to_string());
        world.spawn_projectile(2000.0, 0.0, [0.0, 0.0], "a".to_string());
        world.step(DT, &mut rng);

        let kept: Vec<f32> = world
            .projectiles
            .iter()
            .filter(|projectile| projectile.owner == "a")
            .map(|projectile| projectile.x)
            .collect();
        assert_eq!(kept, vec![500.0]);
    }

    #[test]
    fn test_tick_advances_only_with_players() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        world.step(DT, &mut rng);
        assert_eq!(world.tick, 0);

        world.add_player(1);
        world.step(DT, &mut rng);
        world.step(DT, &mut rng);
        assert_eq!(world.tick, 2);
    }

    #[test]
    fn test_rejoining_id_does_not_duplicate_roster_entry() {
        let mut rng = rng();
        let mut world = World::new(&mut rng);
        world.add_player(1);
        world.add_player(1);
        assert_eq!(world.player_count(), 1);
    }
}
