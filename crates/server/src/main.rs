use std::{sync::Arc, time::Duration};

use anyhow::Result;
use common::{LevelSpec, LogConfig, LogOptions, log_args};
use intercept::LogFacility;
use server::{LogRelay, Logging, RelayConfig};
use tracing::info;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let logging = Logging::new();
    logging.early_init();

    let config = RelayConfig::from_env()?;
    let relay = LogRelay::new(Arc::new(LogFacility::with_tracing()), config)?;
    let listener = relay.start().await?;
    info!(
        url = %format!("ws://{}{}", listener.local_addr(), relay.config().path),
        "log relay ready"
    );

    let app = relay.logger("app", None);
    let db = relay.logger(
        "db",
        Some(LogOptions::Config(LogConfig {
            level: Some(LevelSpec::Name("warn".into())),
            label: Some("database".into()),
            prefix: Some("[db]".into()),
        })),
    );

    let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
    let mut beat: u64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                beat += 1;
                app.info(&log_args!["heartbeat", beat]);
                app.debug(&log_args!["viewers", relay.hub().viewer_count()]);
                db.warn(&log_args!["slow query", serde_json::json!({ "beat": beat, "ms": 120 })]);
                db.trace(&log_args!["pool stats", beat % 7]);
            }
        }
    }

    info!("shutting down");
    listener.shutdown().await;
    Ok(())
}
