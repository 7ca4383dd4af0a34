//! Resumable single-file downloads over links that drop often.
//!
//! - [`downloader`] resumes from the size of the file on disk after every
//!   connection failure and stops cleanly on cancellation.
//! - [`monitor`] probes reachability in the background and reports only
//!   online/offline edges.
//!
//! The two are independent; [`commands::run_single_download`] runs them side
//! by side.

pub mod commands;
pub mod config;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod progress;
pub mod signals;
pub mod state;
pub mod utils;

pub use config::{MonitorConfig, Settings, TransferConfig};
pub use downloader::{Downloader, Outcome};
pub use error::{classify, Disposition, DownloadError, MonitorError};
pub use monitor::{HealthMonitor, HttpProbe, Probe, Transition};
