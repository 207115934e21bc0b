//! Storefront Decision Engine — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_decision_engine::api::{create_router, AppState};
use storefront_decision_engine::config::{
    resolve_config_path, start_hot_reload_thread, ConfigHandle, EngineConfig,
};
use storefront_decision_engine::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - ENGINE_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("ENGINE_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("catalog=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables ENGINE_CONFIG_PATH / STOREFRONT_API_BASE from .env.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    // --- Engine configuration + hot reload ---
    let config = EngineConfig::from_toml().expect("Failed to load engine config");
    let notice_ttl = config.notice_ttl_secs;
    let handle = ConfigHandle::new(config);
    start_hot_reload_thread(handle.clone(), resolve_config_path());

    // Prometheus recorder + /metrics route.
    let metrics = Metrics::init(notice_ttl);

    // Build AppState and pass it into the router.
    let state = AppState::from_config(handle);
    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
