// web-server/src/main.rs
use actix_web::HttpServer;
use common::{setup_tracing, Config};
use web_server::{build_app, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Setup tracing
    setup_tracing();

    // Load configuration
    let config = Config::from_env();

    // Save address before moving config into the app state
    let server_addr = config.web_server_addr.clone();

    tracing::info!("Starting Web Server on {} ({} deployment)", server_addr, config.deployment);

    let state = AppState::from_config(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    // Start HTTP server
    HttpServer::new(move || build_app(&state))
        .bind(&server_addr)?
        .run()
        .await
}
