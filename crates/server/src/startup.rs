use std::{net::SocketAddr, path::Path};

use axum::Router;
use common::utils::logging::{init_logging_compact, init_logging_json};
use configs::{AppConfig, LogFormat};
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, AppState};
use service::registry::HeroRegistry;

fn init_logging(cfg: &AppConfig) {
    match cfg.log.format {
        LogFormat::Json => init_logging_json(&cfg.log.level),
        LogFormat::Compact => init_logging_compact(&cfg.log.level),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Secrets never appear in logs; a configured value shows up as stars only.
fn mask_secret(secret: &str, sentinel: &str) -> String {
    if secret == sentinel {
        sentinel.to_string()
    } else {
        "*".repeat(secret.len())
    }
}

/// Public entry: load config, open the registry, and run the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = configs::load_default()?;
    init_logging(&cfg);

    info!(
        greeting = %cfg.registry.greeting,
        log_level = %cfg.log.level,
        auth_mode = ?cfg.auth.mode,
        data_dir = %cfg.registry.data_dir,
        "configuration loaded"
    );
    info!(
        api_key = %mask_secret(&cfg.auth.api_key, configs::NO_API_KEY),
        database_password = %mask_secret(&cfg.database_password, configs::NO_DB_PASSWORD),
        "secrets loaded (values masked)"
    );

    // missing data directory is the one unrecoverable startup condition
    common::env::ensure_data_dir(&cfg.registry.data_dir).await?;
    let hero_file = Path::new(&cfg.registry.data_dir).join("heroes.json");
    let registry = HeroRegistry::open(hero_file).await?;

    let state = AppState {
        registry,
        greeting: cfg.registry.greeting.clone(),
        auth: cfg.auth.clone(),
    };
    let app: Router = routes::build_router(state, build_cors());

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting hero registry server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
