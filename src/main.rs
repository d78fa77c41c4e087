use std::time::Duration;

use anyhow::{Context, Result};
use crackdefend_console::{
    app::ConsoleApp, config::AppConfig, fetcher::ApiClient, logger, preferences::Preferences,
};
use tracing::info;

fn main() -> Result<()> {
    logger::init_tracing("info");

    let config = AppConfig::load_or_create("config/config.json")?;
    let audit = logger::AuditLog::new(&config.log_path)?;
    audit.record("CrackDefend console started")?;
    let prefs = Preferences::load(&config.preferences_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;
    let api = ApiClient::new(
        &config.api.base_url,
        Duration::from_millis(config.api.request_timeout_ms),
    )?;
    info!(base_url = api.base_url(), "polling lab backend");

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "CrackDefend Console",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(ConsoleApp::new(
                cc, config, runtime, api, audit, prefs,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to start CrackDefend UI: {e}"))?;

    Ok(())
}
