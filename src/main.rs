use std::sync::Arc;

use tracing::info;

use depot::{Config, Storage, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = depot::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        depot::logging::init_console_only(&config.logging.level);
    }

    info!("Depot - binary distributables depot");

    let storage = match Storage::new(&config.storage.upload_dir, &config.storage.backup_dir) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            std::process::exit(1);
        }
    };

    // Replay any backup snapshot before serving requests
    storage.restore();

    let server = match WebServer::new(&config.server, &config.storage, storage) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to configure web server: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        eprintln!("Web server error: {e}");
        std::process::exit(1);
    }
}
