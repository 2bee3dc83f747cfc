use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use stockreaper_core::Extension;

/// Run the scheduler in the foreground until Ctrl+C
pub async fn start(extension: &Extension) -> Result<()> {
    let scheduler = extension.scheduler()?;

    if extension.scheduled_job().await?.is_none() {
        println!(
            "Note: '{}' is not scheduled; run 'stockreaper activate' to enable it.",
            extension.job_name()
        );
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    println!("Scheduler running (PID: {}). Press Ctrl+C to stop.", std::process::id());

    // Blocks until shutdown
    scheduler.run(shutdown_rx).await;

    println!("Scheduler stopped.");
    Ok(())
}
