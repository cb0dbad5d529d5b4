//! HTTP and WebSocket routing configuration.

use actix_web::web;
use crate::server::relay::session::ws_relay;

/// Configure the application's routes. Each duel room is a websocket
/// resource; both peers of a duel connect to the same room id.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/ws/duel/{room_id}")
            .to(ws_relay)
    );
}
