use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::DownloadError;

/// Bookkeeping for one `download()` call. The file on disk is the source of
/// truth for the resume offset; `bytes_on_disk` is re-read before every attempt.
#[derive(Debug, Clone)]
pub struct DownloadSession {
    pub filepath: PathBuf,
    pub bytes_on_disk: u64,
    pub total_size: u64,
}

impl DownloadSession {
    pub async fn open(filepath: &Path) -> Result<Self, DownloadError> {
        let bytes_on_disk = size_on_disk(filepath).await?;
        Ok(Self {
            filepath: filepath.to_path_buf(),
            bytes_on_disk,
            total_size: 0,
        })
    }

    pub async fn refresh(&mut self) -> Result<(), DownloadError> {
        self.bytes_on_disk = size_on_disk(&self.filepath).await?;
        Ok(())
    }

    pub fn is_resuming(&self) -> bool {
        self.bytes_on_disk > 0
    }

    pub fn range_header(&self) -> String {
        format!("bytes={}-", self.bytes_on_disk)
    }

    /// `remaining` is the content-length of the current response, if any.
    pub fn set_remaining(&mut self, remaining: Option<u64>) {
        self.total_size = self.bytes_on_disk + remaining.unwrap_or(0);
    }
}

async fn size_on_disk(path: &Path) -> Result<u64, DownloadError> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}
