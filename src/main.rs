use actix_web::{web, App, HttpServer};
use chat_relay_server::{web::configure, AppError, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> chat_relay_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    let workers = config.server.workers.max(1) as usize;
    let listener = TcpListener::bind(config.bind_address())?;
    let state = web::Data::new(AppState::new(config.clone()));

    info!("Chat relay ready at http://{0} (websocket: ws://{0}/ws)", config.bind_address());

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure)
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    info!("Chat relay stopped");
    Ok(())
}
