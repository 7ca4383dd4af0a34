use bytes::BytesMut;
use futures::StreamExt;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use indicatif::HumanBytes;
use reqwest::{header, Client, Response, StatusCode};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::TransferConfig;
use crate::error::{classify, Disposition, DownloadError};
use crate::progress::AttemptProgress;
use crate::state::DownloadSession;
use crate::utils::get_filename_from_url;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Terminal state of a `download()` call.
#[derive(Debug)]
pub enum Outcome {
    Completed,
    /// Cancelled by the operator; the partial file is valid and resumable.
    Stopped,
    Failed(DownloadError),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

enum AttemptEnd {
    Completed,
    Stopped,
}

/// Single-connection downloader that resumes from the size of the file on
/// disk after every dropped connection.
pub struct Downloader {
    client: Client,
    url: String,
    filename: String,
    filepath: PathBuf,
    config: TransferConfig,
    cancel: CancellationToken,
    rate_limiter: Option<DirectLimiter>,
}

impl Downloader {
    pub fn new(
        url: impl Into<String>,
        output_dir: &Path,
        config: TransferConfig,
        cancel: CancellationToken,
    ) -> Result<Self, DownloadError> {
        config.validate()?;
        let url = url.into();
        let filename = get_filename_from_url(&url)?;
        let filepath = output_dir.join(&filename);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .build()?;

        // Burst must cover a whole chunk or `until_n_ready` can never succeed.
        let rate_limiter = config.rate_limit.and_then(NonZeroU32::new).map(|limit| {
            let chunk = u32::try_from(config.chunk_size)
                .ok()
                .and_then(NonZeroU32::new)
                .unwrap_or(limit);
            RateLimiter::direct(Quota::per_second(limit).allow_burst(limit.max(chunk)))
        });

        Ok(Self {
            client,
            url,
            filename,
            filepath,
            config,
            cancel,
            rate_limiter,
        })
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    /// Runs until the file is complete, the token is cancelled, or a fatal
    /// error occurs. Network faults and soft server errors are retried.
    pub async fn download(&self) -> Outcome {
        match self.run().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Fatal error: {}", e);
                Outcome::Failed(e)
            }
        }
    }

    async fn run(&self) -> Result<Outcome, DownloadError> {
        let mut session = DownloadSession::open(&self.filepath).await?;
        if session.is_resuming() {
            info!("Resuming '{}' from {}", self.filename, HumanBytes(session.bytes_on_disk));
        } else {
            info!("Initializing download: '{}'", self.filename);
        }

        let mut retries: u32 = 0;
        loop {
            if self.cancel.is_cancelled() {
                info!("Download stopped at {}", HumanBytes(session.bytes_on_disk));
                return Ok(Outcome::Stopped);
            }

            let offset = session.bytes_on_disk;
            let err = match self.attempt(&mut session).await {
                Ok(AttemptEnd::Completed) => return Ok(Outcome::Completed),
                Ok(AttemptEnd::Stopped) => {
                    info!("Download stopped at {}", HumanBytes(session.bytes_on_disk));
                    return Ok(Outcome::Stopped);
                }
                Err(e) => e,
            };

            if classify(&err) == Disposition::Fatal {
                return Err(err);
            }
            // The ceiling counts consecutive failures without progress.
            if session.bytes_on_disk > offset {
                retries = 0;
            }
            if let Some(max) = self.config.max_retries {
                if retries >= max {
                    return Err(DownloadError::RetriesExhausted {
                        retries,
                        last: Box::new(err),
                    });
                }
            }
            retries += 1;
            warn!(
                "{}. Retrying in {:?} (retry {})...",
                err,
                self.config.retry_delay(),
                retries
            );

            tokio::select! {
                _ = self.cancel.cancelled() => continue,
                _ = tokio::time::sleep(self.config.retry_delay()) => {}
            }
            session.refresh().await?;
        }
    }

    async fn attempt(&self, session: &mut DownloadSession) -> Result<AttemptEnd, DownloadError> {
        let range = session.range_header();
        debug!("GET {} ({})", self.url, range);
        let request = self.client.get(&self.url).header(header::RANGE, range);

        let response = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(AttemptEnd::Stopped),
            response = request.send() => response?,
        };

        match response.status() {
            StatusCode::RANGE_NOT_SATISFIABLE => {
                info!("'{}' is already complete ({})", self.filename, HumanBytes(session.bytes_on_disk));
                return Ok(AttemptEnd::Completed);
            }
            StatusCode::OK if session.is_resuming() => {
                return Err(DownloadError::RangeIgnored(session.bytes_on_disk));
            }
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => {}
            status => return Err(DownloadError::UnexpectedStatus(status)),
        }

        session.set_remaining(response.content_length());
        let mut file = self.open_output(session.is_resuming()).await?;
        let end = self.stream_body(response, &mut file, session).await?;

        if let AttemptEnd::Completed = end {
            info!("Download complete: '{}' ({})", self.filename, HumanBytes(session.bytes_on_disk));
        }
        Ok(end)
    }

    async fn open_output(&self, resuming: bool) -> Result<File, DownloadError> {
        let mut options = OpenOptions::new();
        if resuming {
            options.append(true);
        } else {
            options.create(true).write(true).truncate(true);
        }
        Ok(options.open(&self.filepath).await?)
    }

    async fn stream_body(
        &self,
        response: Response,
        file: &mut File,
        session: &mut DownloadSession,
    ) -> Result<AttemptEnd, DownloadError> {
        let chunk_size = self.config.chunk_size;
        let mut progress = AttemptProgress::start(&self.filename, session.total_size, self.config.show_progress);
        let mut stream = response.bytes_stream();
        let mut pending = BytesMut::with_capacity(chunk_size);

        let end = 'stream: loop {
            let item = tokio::select! {
                _ = self.cancel.cancelled() => break 'stream AttemptEnd::Stopped,
                item = stream.next() => item,
            };

            match item {
                Some(bytes) => {
                    let bytes = bytes?;
                    if bytes.is_empty() {
                        continue;
                    }
                    pending.extend_from_slice(&bytes);
                    while pending.len() >= chunk_size {
                        let chunk = pending.split_to(chunk_size);
                        if !self.write_chunk(file, &chunk, session, &mut progress).await? {
                            break 'stream AttemptEnd::Stopped;
                        }
                    }
                }
                None => {
                    if !pending.is_empty() {
                        let chunk = pending.split();
                        if !self.write_chunk(file, &chunk, session, &mut progress).await? {
                            break 'stream AttemptEnd::Stopped;
                        }
                    }
                    break 'stream AttemptEnd::Completed;
                }
            }
        };

        Ok(end)
    }

    /// Returns `false` without writing when cancellation was requested.
    async fn write_chunk(
        &self,
        file: &mut File,
        chunk: &[u8],
        session: &mut DownloadSession,
        progress: &mut AttemptProgress,
    ) -> Result<bool, DownloadError> {
        if self.cancel.is_cancelled() {
            return Ok(false);
        }

        if let Some(limiter) = &self.rate_limiter {
            if let Some(n) = NonZeroU32::new(chunk.len() as u32) {
                tokio::select! {
                    _ = self.cancel.cancelled() => return Ok(false),
                    ready = limiter.until_n_ready(n) => {
                        ready.map_err(|e| DownloadError::RateLimit(e.to_string()))?;
                    }
                }
            }
        }

        file.write_all(chunk).await?;
        file.flush().await?;
        session.bytes_on_disk += chunk.len() as u64;
        progress.record(chunk.len() as u64, session.bytes_on_disk);
        Ok(true)
    }
}
