//! Kiosk session binary.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use booth_kiosk::{BoothSession, KioskConfig, TransactionClient};
use booth_media::{NullSurface, Surface};
use booth_storage::{S3Client, ShareGateway};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let env_filter = EnvFilter::from_default_env().add_directive("booth=info".parse().unwrap());
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(true).with_target(true))
        .with(env_filter)
        .init();

    info!("Starting booth-kiosk");

    let config = match KioskConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let client = TransactionClient::new(config.api_base_url.clone());

    // Session parameters come from the API, which decrypts and records them
    let params = match client.resolve_session(&config.session_query).await {
        Ok(p) => p,
        Err(e) => {
            error!("Session not resolved: {e}");
            std::process::exit(1);
        }
    };

    let storage = match S3Client::from_env().await {
        Ok(s) => s,
        Err(e) => {
            error!("Storage client error: {e}");
            std::process::exit(1);
        }
    };
    let gateway = ShareGateway::new(Arc::new(storage));

    let session = match BoothSession::new(config, params, client, gateway) {
        Ok(s) => s,
        Err(e) => {
            error!("Session setup failed: {e}");
            std::process::exit(1);
        }
    };

    // Headless kiosk: the composited preview goes to the recorder/capture
    // path only
    let surface: Arc<Mutex<dyn Surface>> = Arc::new(Mutex::new(NullSurface));

    match session.run(surface).await {
        Ok(outcome) => {
            info!(
                path = %outcome.local_path.display(),
                download_name = %outcome.download_name,
                uploaded = outcome.upload_started,
                "Capture ready"
            );
        }
        Err(e) => {
            error!("Session failed: {e}");
            std::process::exit(1);
        }
    }
}
