use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::downloader::{Downloader, Outcome};
use crate::monitor::HealthMonitor;
use crate::signals;

/// Runs one resumable download with the health monitor alongside it.
///
/// The monitor is advisory: its state is only reported when the transfer
/// ends without completing.
pub async fn run_single_download(
    url: String,
    output: PathBuf,
    settings: Settings,
    with_monitor: bool,
) -> Result<Outcome> {
    if !output.exists() {
        fs::create_dir_all(&output).await.context("Failed to create output directory")?;
    }

    let cancel = CancellationToken::new();
    let downloader = Downloader::new(url, &output, settings.transfer, cancel.clone())
        .context("Failed to set up downloader")?;

    let mut monitor = if with_monitor {
        let mut monitor = HealthMonitor::from_config(&settings.monitor)
            .context("Failed to set up health monitor")?;
        monitor.start()?;
        Some(monitor)
    } else {
        None
    };

    let interrupt = signals::cancel_on_interrupt(cancel.clone());
    let outcome = downloader.download().await;
    interrupt.abort();

    if let Some(monitor) = monitor.as_mut() {
        if !outcome.is_completed() && !monitor.status() {
            warn!("Network was unreachable when the transfer ended");
        }
        monitor.shutdown().await;
    }

    match &outcome {
        Outcome::Completed => info!("Saved to {}", downloader.filepath().display()),
        Outcome::Stopped => warn!(
            "Download paused; run the same command again to resume {}",
            downloader.filepath().display()
        ),
        Outcome::Failed(e) => error!("Download aborted: {}", e),
    }

    Ok(outcome)
}
