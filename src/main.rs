//! Main entry point for the duel relay server.
//!
//! Starts the relay actor and the HTTP server exposing one websocket
//! endpoint per duel room.

use actix::Actor;
use actix_web::{web, App, HttpServer};
use log::{error, info};

use duel_grid::config::EngineConfig;
use duel_grid::server::relay::RelayServer;
use duel_grid::server::{router, state::AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Level comes from RUST_LOG.
    env_logger::init();

    // DUEL_GRID_CONFIG names an optional JSON override file.
    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("[Config] {}", e);
            return Err(std::io::Error::other(e));
        }
    };
    let server = config.server;

    let relay_addr = RelayServer::new(server.max_peers_per_room).start();
    let state = web::Data::new(AppState::new(relay_addr));

    info!("[Relay] Listening on {}:{}", server.host, server.port);
    HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "*"))
            )
            .app_data(state.clone())
            .configure(router::config)
    })
    .bind(server.bind_addr())?
    .run()
    .await
}
