//! Server network layer: the listener, the event queue, and the tick loop.
//!
//! All world mutation happens on one task inside [`Server::run`]. Connection
//! tasks communicate with it exclusively through [`ServerEvent`]s, so each
//! tick sees a consistent ingest-resolve-broadcast sequence: snapshot N
//! reflects every intent that arrived before tick N's resolve phase.

use crate::connection::{self, SessionRegistry};
use crate::world::World;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{encode_frame, ClientMessage, ServerMessage};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

/// Messages sent from connection tasks to the tick loop.
#[derive(Debug)]
pub enum ServerEvent {
    Connected { id: u32 },
    Disconnected { id: u32 },
    Intent { id: u32, message: ClientMessage },
}

/// The authoritative server: owns the listener, the session registry, and
/// the world, and runs the fixed-rate simulation loop.
pub struct Server {
    listener: TcpListener,
    registry: SessionRegistry,
    world: World,
    rng: StdRng,
    tick_duration: Duration,
    max_clients: usize,
    next_conn_id: u32,
    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn bind(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut rng = StdRng::from_entropy();
        let world = World::new(&mut rng);

        Ok(Server {
            listener,
            registry: SessionRegistry::new(),
            world,
            rng,
            tick_duration,
            max_clients,
            next_conn_id: 1,
            event_tx,
            event_rx,
        })
    }

    /// The bound address; useful when binding port 0 in tests.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop and the simulation loop until the process is
    /// terminated. The tick loop is the process's only unit of work; there
    /// is no supervised restart.
    pub async fn run(&mut self) {
        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.handle_accept(stream, addr),
                        Err(e) => error!("Error accepting connection: {}", e),
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    self.ingest();

                    // With nobody connected the world freezes entirely.
                    if self.world.player_count() == 0 {
                        continue;
                    }

                    self.world.step(dt, &mut self.rng);
                    self.broadcast_snapshot();
                },
            }
        }
    }

    fn handle_accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        if self.registry.len() >= self.max_clients {
            warn!("refusing connection from {}: server full", addr);
            return;
        }

        let id = self.next_conn_id;
        self.next_conn_id += 1;

        // Queue the roster registration before the reader task can produce
        // any intent, so ingest order matches connection order.
        if self.event_tx.send(ServerEvent::Connected { id }).is_err() {
            return;
        }

        let session = connection::spawn(id, addr, stream, self.event_tx.clone());
        self.registry.insert(session);
    }

    /// Drains every queued event. This is the only place the roster or the
    /// world mutates.
    fn ingest(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                ServerEvent::Connected { id } => self.world.add_player(id),
                ServerEvent::Disconnected { id } => {
                    self.registry.remove(id);
                    self.world.remove_player(id);
                }
                ServerEvent::Intent { id, message } => self.apply_intent(id, message),
            }
        }
    }

    fn apply_intent(&mut self, id: u32, message: ClientMessage) {
        match message {
            ClientMessage::Move { x, y, name } => {
                self.world.apply_move(id, x, y, name);
            }
            ClientMessage::Projectile {
                x,
                y,
                velocity,
                name,
            } => {
                self.world.spawn_projectile(x, y, velocity, name);
            }
            ClientMessage::LaserBeam { x, y, angle, .. } => {
                debug!("client {} fires a laser at {:.2} rad", id, angle);
                self.world.spawn_laser(x, y, angle);
            }
            ClientMessage::Chat { message, sender } => {
                self.relay_chat(message, sender);
            }
        }
    }

    /// Relays a chat line to every session whose claimed name differs from
    /// the sender. Matching is by display name, so two sessions sharing a
    /// name skip each other's messages.
    fn relay_chat(&mut self, message: String, sender: String) {
        let frame = match encode_frame(&ServerMessage::Chat {
            message,
            sender: sender.clone(),
        }) {
            Ok(frame) => frame,
            Err(e) => {
                error!("failed to encode chat frame: {}", e);
                return;
            }
        };

        for session in self.registry.iter() {
            let name = self.world.player_name(session.id).unwrap_or("");
            if name != sender {
                session.send(frame.clone());
            }
        }
    }

    /// Serializes the world once and queues it on every session,
    /// unconditionally, every tick.
    fn broadcast_snapshot(&mut self) {
        if self.registry.is_empty() {
            return;
        }

        let snapshot = self.world.snapshot();
        match encode_frame(&ServerMessage::GameState { data: snapshot }) {
            Ok(frame) => self.registry.broadcast(&frame),
            Err(e) => error!("failed to encode snapshot: {}", e),
        }
    }
}
