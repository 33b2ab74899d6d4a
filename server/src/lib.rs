//! # Authoritative Game Server
//!
//! This library implements the server side of the arena game: one process
//! holds the only trusted copy of the world and advances it on a fixed-rate
//! tick, feeding every connected client the same full snapshot.
//!
//! ## Architecture
//!
//! The design is single-writer. Per-connection reader tasks decode intents
//! and enqueue them; the tick loop is the sole owner of the world and the
//! session registry, applying queued events at the start of each tick and
//! broadcasting the resulting state at the end. No lock discipline is
//! needed because there is exactly one mutator; the guarantee clients get
//! is ordering, not locking: snapshot N reflects every intent ingested
//! before tick N resolved.
//!
//! Each tick runs, in order:
//!
//! 1. ingest queued connects, disconnects, and intents
//! 2. skip the rest if the roster is empty
//! 3. advance the enemy toward the nearest player, maybe firing
//! 4. integrate projectiles and resolve their hits
//! 5. integrate laser beams and resolve their hits
//! 6. count down the enemy hit-stun timer
//! 7. cull projectiles far from the reference player
//! 8. serialize and broadcast the snapshot
//!
//! ## Module Organization
//!
//! - [`entity`] — authoritative Player/Enemy/Projectile/LaserBeam records
//! - [`world`] — the world state and per-tick simulation
//! - [`connection`] — per-connection reader/writer tasks and the registry
//! - [`network`] — the listener, event queue, and tick loop
//!
//! ## Trust Model
//!
//! Inputs are applied verbatim: there is no movement validation, rate
//! limiting, or fire-entitlement check. This is recorded as an open gap in
//! DESIGN.md rather than silently fixed, because fixing it changes
//! behavior that wire-compatible clients can observe.

pub mod connection;
pub mod entity;
pub mod network;
pub mod world;
