// src/server/state.rs

//! Application state for the relay server.
//!
//! Shared between HTTP/WebSocket handlers and the actor system.

use actix::Addr;
use crate::server::relay::RelayServer;

/// Shared application state, injected into HTTP/WebSocket handlers.
pub struct AppState {
    /// Address of the relay actor that owns every duel room.
    pub relay_addr: Addr<RelayServer>,
}

impl AppState {
    pub fn new(relay_addr: Addr<RelayServer>) -> Self {
        AppState { relay_addr }
    }
}
