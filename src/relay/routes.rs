use actix_web::web;

use super::socket::ws_index;

/// Configure the HTTP routes. The socket is served on `/` and `/ws`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(ws_index)))
        .service(web::resource("/").route(web::get().to(ws_index)));
}
