use clap::Parser;
use dotenv::dotenv;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vps_storefront::server::config::StorefrontConfig;
use vps_storefront::version::VERSION;
use vps_storefront::web::{AppState, create_axum_router};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "storefront.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info,sea_orm=warn` level if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn connect_database(url: &str) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let mut opt = ConnectOptions::new(url.to_owned());
    opt.max_connections(5)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    Database::connect(opt).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for the shutdown signal.");
        return;
    }
    info!("Shutdown signal received, draining connections.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Keep the plain one-line output of `--version`.
    if std::env::args().any(|arg| arg == "--version") {
        println!("Storefront version: {VERSION}");
        return Ok(());
    }
    let args = Args::parse();
    dotenv().ok();

    let config = match StorefrontConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load storefront configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&config.log_dir);
    info!(version = VERSION, api = %config.api_base_url, "Starting storefront.");

    // The database only backs the registration pre-check; run without it if absent.
    let db = match config.database_url.as_deref() {
        Some(url) => match connect_database(url).await {
            Ok(db) => {
                info!("Connected to the customer database.");
                Some(db)
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to the customer database.");
                return Err(e.into());
            }
        },
        None => None,
    };

    let app_state = Arc::new(AppState::new(config.clone(), db)?);
    let app = create_axum_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "HTTP server listening.");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Storefront stopped.");
    Ok(())
}
