// src/server/mod.rs

//! Server layer root module.
//!
//! - `peer`: the actor hosting one peer's battlefield and its fixed tick
//! - `relay`: websocket rooms forwarding RPC envelopes between two peers
//! - application state, routing and error frames for the HTTP side

pub mod state;
pub mod router;
pub mod peer;
pub mod relay;
pub mod ws_error;
