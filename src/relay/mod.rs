//! Reference relay server. Pairs two clients per game and forwards their
//! moves to each other.

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use log::info;
use std::net::TcpListener;

use crate::config::RelayConfig;

pub mod routes;
pub mod socket;
pub mod state;

pub use socket::RelaySocket;
pub use state::RelayState;

/// Bind the relay to `config.bind`.
pub fn bind(config: &RelayConfig) -> std::io::Result<Server> {
    let listener = TcpListener::bind(&config.bind)?;
    serve(listener)
}

/// Serve the relay on an already bound listener.
pub fn serve(listener: TcpListener) -> std::io::Result<Server> {
    info!("Starting chess relay at ws://{}", listener.local_addr()?);

    let state = web::Data::new(RelayState::default());
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::configure_routes)
    })
    .workers(1)
    .listen(listener)?
    .run();

    Ok(server)
}
