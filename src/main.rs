use domain::gateway::google_oauth::GoogleOAuthClient;
use log::*;
use migration::{Migrator, MigratorTrait};
use service::{config::Config, logging::Logger, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Starting up Google sign-in service...");
    info!("Runtime environment: {}", config.runtime_env());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(db.as_ref(), None).await {
        error!("Failed to apply database migrations: {e}");
        std::process::exit(1);
    }

    let oauth_provider = match GoogleOAuthClient::from_config(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Google OAuth is not configured: {e}");
            std::process::exit(1);
        }
    };

    let service_state = AppState::new(config, &db);
    let app_state = web::AppState::new(service_state, oauth_provider);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with an error: {e}");
        std::process::exit(1);
    }
}
