//! Tick scheduler demo daemon
//!
//! Loads the scheduler settings, runs a scheduler that logs every tick, and
//! shuts down cleanly on Ctrl-C.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Command;
use log::{error, info};

use tick_scheduler::config::ProjectConfig;
use tick_scheduler::TickScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let _matches = Command::new("tick-scheduler")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run a periodic tick scheduler that logs every tick")
        .get_matches();

    let project_config = ProjectConfig::new()
        .await
        .context("Failed to load configuration")?;
    let settings = project_config.settings;
    info!(
        "Config dir: {}",
        project_config.project_dirs.config_dir().display()
    );
    info!(
        "Tick interval: {:?}, error policy: {}",
        settings.tick_interval, settings.error_policy
    );

    let scheduler =
        TickScheduler::new(settings.tick_interval).context("Invalid tick interval")?;
    scheduler.set_policy(settings.error_policy)?;

    let tick_count = Arc::new(AtomicU64::new(0));
    let counter = tick_count.clone();
    scheduler.on_tick(Arc::new(move || {
        let counter = counter.clone();
        Box::pin(async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            info!("⏰ Tick #{}", n);
            Ok(())
        })
    }));
    scheduler.on_error(Arc::new(|err| {
        error!("Tick callback failed: {}", err);
    }));

    scheduler.start().await?;
    info!("🚀 Scheduler running, press Ctrl-C to exit");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    scheduler.dispose().await;
    let stats = scheduler.stats();
    info!(
        "✅ Shut down after {} cycle(s), {} failure(s), average cycle {:?}",
        stats.total_cycles,
        stats.total_failures,
        stats.average_cycle()
    );
    Ok(())
}
