use std::{io, sync::Arc};

use actix_web::{middleware::Logger, web, App, HttpServer};
use session_test_generator::{
    app_state::AppState, config::Config, handlers, middleware::RequestIdMiddleware,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    config.validate_for_production().map_err(io::Error::other)?;

    let host = config.web_server_host.clone();
    let port = config.web_server_port;
    let state = web::Data::new(Arc::new(AppState::new(config).map_err(io::Error::other)?));

    log::info!("starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
