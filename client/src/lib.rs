//! # Game Client Library
//!
//! The mirroring side of the protocol: a framed connection that submits
//! intents and applies the server's snapshot stream onto presentation
//! records a renderer can draw from.
//!
//! The presentation types are deliberately distinct from the server's
//! authoritative records. A renderer, input mapper, chat box, or shop UI
//! sits on top of this crate and consumes exactly two interfaces: the
//! outgoing intent methods on [`network::Client`] and the mirror state in
//! [`world::ClientWorld`].

pub mod network;
pub mod world;
