use clap::Parser;
use persist_dl::config::Settings;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Resumable single-file downloader for flaky links", long_about = None)]
pub struct Args {
    /// URL to download
    #[arg(index = 1)]
    pub url: String,

    /// Directory to save the downloaded file
    #[arg(short = 'd', long = "download-dir", default_value = ".")]
    pub download_dir: PathBuf,

    /// JSON settings file; flags below override its values
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Bytes written per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Pause between retries in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Give up after this many retries (default: retry forever)
    #[arg(short = 'm', long)]
    pub max_retries: Option<u32>,

    /// Rate limit in bytes per second (e.g., 1048576 for 1MB/s)
    #[arg(short = 'r', long)]
    pub rate_limit: Option<u32>,

    /// Endpoint probed by the network health monitor
    #[arg(long)]
    pub probe_target: Option<String>,

    /// Do not run the network health monitor
    #[arg(long)]
    pub no_monitor: bool,

    /// Hide the progress line
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    pub fn apply(&self, settings: &mut Settings) {
        let transfer = &mut settings.transfer;
        if let Some(chunk_size) = self.chunk_size {
            transfer.chunk_size = chunk_size;
        }
        if let Some(delay) = self.retry_delay_ms {
            transfer.retry_delay_ms = delay;
        }
        if self.max_retries.is_some() {
            transfer.max_retries = self.max_retries;
        }
        if self.rate_limit.is_some() {
            transfer.rate_limit = self.rate_limit;
        }
        if self.quiet {
            transfer.show_progress = false;
        }
        if let Some(target) = &self.probe_target {
            settings.monitor.target = target.clone();
        }
    }
}
