//! Peer-authoritative battlefield sync for a two-player duel.
//!
//! `game` is the transport-agnostic core (ownership, grid placement, movement,
//! pooling, RPC messages); `server` hosts it in actix actors and relays the
//! RPC envelopes between two peers over websockets.

pub mod config;
pub mod game;
pub mod server;
