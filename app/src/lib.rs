//! Portal application library

pub mod context;

use anyhow::Context as _;
use portal_core::AppConfig;

pub use context::{AppContext, ContextError, WalletState};

/// Environment variable naming a JSON config file
pub const CONFIG_ENV: &str = "PORTAL_CONFIG";

/// Load the config named by `PORTAL_CONFIG`, else the built-in networks
pub fn load_config() -> anyhow::Result<AppConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            let config = AppConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path))?;
            tracing::info!(path = %path, "Loaded configuration");
            Ok(config)
        }
        Err(_) => {
            tracing::info!("Using default network configuration");
            Ok(AppConfig::default())
        }
    }
}

/// Run the bridge core until Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portal=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    tracing::info!("Starting Portal");

    let config = load_config()?;
    let context = AppContext::new(config).map_err(|e| {
        tracing::error!(error = %e, "Invalid network configuration");
        e
    })?;

    let group = context.active_group().await;
    tracing::info!(
        group = %group.key,
        networks = group.network_list().len(),
        "Active network group"
    );
    context.mount().await;

    let mut status = context.scheduler().watch_status();
    let mut last_refresh = status.borrow().last_refresh_ms;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                if current.last_refresh_ms == last_refresh || current.is_refreshing {
                    continue;
                }
                last_refresh = current.last_refresh_ms;

                let fee = context.fee_snapshot().await;
                tracing::info!(
                    has_errors = current.has_errors,
                    countdown = current.countdown,
                    fee = fee.formatted_fee.as_deref().unwrap_or("-"),
                    "Refresh cycle finished"
                );
            }
        }
    }

    tracing::info!("Shutting down");
    context.unmount().await;
    Ok(())
}
