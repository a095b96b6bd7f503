//! Single binary web server for the tournament REST API.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Set ORACLE_API_KEY (and optionally ORACLE_URL, ORACLE_MODEL, ORACLE_TIMEOUT_SECS) to let
//! planned knockouts consult the schedule oracle.

use actix_web::{middleware, web::Data, App, HttpServer};
use std::time::Duration;
use team_tournament_web::api::{self, AppState};
use team_tournament_web::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    if config.oracle.is_some() {
        log::info!("Schedule oracle enabled");
    } else {
        log::info!("Schedule oracle disabled, planned knockouts use local byes");
    }

    let planner = config
        .planner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let state = Data::new(AppState::new(planner));

    // Background task: every 30 minutes, remove tournaments inactive past the timeout
    let state_cleanup = state.clone();
    let inactivity_timeout = config.inactivity_timeout;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            match state_cleanup.store.purge_inactive(inactivity_timeout) {
                Ok(0) => {}
                Ok(removed) => log::info!("Cleaned up {} inactive tournament(s)", removed),
                Err(e) => log::warn!("Cleanup skipped: {}", e),
            }
        }
    });

    log::info!("Starting server at http://{}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
