//! Performance benchmarks for the hot paths of the simulation tick.

use rand::rngs::StdRng;
use rand::SeedableRng;
use server::world::World;
use shared::collision::{beam_end_point, beam_hits_point, point_in_box};
use shared::{encode_frame, ServerMessage, ENEMY_SIZE};
use std::time::Instant;

/// Benchmarks the box containment test
#[test]
fn benchmark_box_containment() {
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let px = (i % 200) as f32;
        let _ = point_in_box(px, 50.0, 0.0, 0.0, 100.0);
    }

    let duration = start.elapsed();
    println!(
        "Box containment: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 100ms for 100k iterations
    assert!(duration.as_millis() < 100);
}

/// Benchmarks the laser proximity test
#[test]
fn benchmark_beam_proximity() {
    let start_point = [0.0, 0.0];
    let end = beam_end_point(start_point, 0.7);

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let target = [(i % 1000) as f32, ((i * 7) % 1000) as f32];
        let _ = beam_hits_point(start_point, end, target, ENEMY_SIZE);
    }

    let duration = start.elapsed();
    println!(
        "Beam proximity: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 100);
}

/// Benchmarks whole-world ticks with a busy entity population
#[test]
fn benchmark_world_step_with_crowd() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut world = World::new(&mut rng);

    // Keep the enemy far from the projectile field so hits do not thin it.
    world.enemy.x = 50_000.0;
    world.enemy.y = 50_000.0;

    for id in 0..8 {
        world.add_player(id);
        world.apply_move(id, (id as f32) * 10.0, 0.0, format!("player-{}", id));
    }

    for i in 0..200 {
        let offset = (i as f32) * 4.0 - 400.0;
        world.spawn_projectile(offset, offset / 2.0, [0.0, 0.0], "player-0".to_string());
    }

    let dt = 1.0 / 60.0;
    let iterations = 1000;
    let start = Instant::now();

    for _ in 0..iterations {
        world.step(dt, &mut rng);
    }

    let duration = start.elapsed();
    println!(
        "World step: 8 players, 200+ projectiles × {} ticks in {:?} ({:.2} μs/tick)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // A tick budget of 16ms means 1000 ticks must fit well under a second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks snapshot serialization, the per-tick broadcast cost
#[test]
fn benchmark_snapshot_encoding() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut world = World::new(&mut rng);

    for id in 0..16 {
        world.add_player(id);
        world.apply_move(id, (id as f32) * 25.0, 0.0, format!("player-{}", id));
    }
    for i in 0..100 {
        world.spawn_projectile((i as f32) * 5.0, 0.0, [0.0, 0.0], "player-0".to_string());
    }
    for i in 0..10 {
        world.spawn_laser(0.0, 0.0, (i as f32) * 0.6);
    }

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let snapshot = world.snapshot();
        let _ = encode_frame(&ServerMessage::GameState { data: snapshot }).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot encode: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 5000);
}

/// Benchmarks respawn placement, whose rejection sampling has no iteration
/// cap and must still terminate fast in practice
#[test]
fn benchmark_respawn_sampling() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut world = World::new(&mut rng);

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        world.enemy.health = 0;
        world.enemy.respawn(&mut rng, (123.0, -456.0));
    }

    let duration = start.elapsed();
    println!(
        "Respawn sampling: {} respawns in {:?} ({:.2} ns/respawn)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}
