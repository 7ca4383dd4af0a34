//! Background reachability probe.
//!
//! The monitor owns a single `is_online` flag published through a `watch`
//! channel. Only edges (online -> offline, offline -> online) are logged and
//! delivered to subscribers; repeated identical probe results are silent.
//! Nothing in the transfer engine reads this flag.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::MonitorError;

#[async_trait]
pub trait Probe: Send + Sync + 'static {
    /// `true` if the transport round-trip succeeded.
    async fn reachable(&self) -> bool;
}

/// Sends `HEAD` to a near-zero-byte endpoint. Any HTTP response counts as
/// reachable; only transport failures do not.
pub struct HttpProbe {
    client: Client,
    target: String,
}

impl HttpProbe {
    pub fn new(config: &MonitorConfig) -> Result<Self, MonitorError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            target: config.target.clone(),
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn reachable(&self) -> bool {
        match self.client.head(&self.target).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!("probe to {} failed: {}", self.target, e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentOffline,
    Recovered,
}

struct Shared<P> {
    probe: P,
    online: watch::Sender<bool>,
}

impl<P: Probe> Shared<P> {
    async fn check(&self) -> Option<Transition> {
        let reachable = self.probe.reachable().await;
        let changed = self.online.send_if_modified(|online| {
            if *online == reachable {
                return false;
            }
            *online = reachable;
            true
        });

        match (changed, reachable) {
            (false, _) => None,
            (true, true) => {
                info!("Network RECOVERED. Link is stable again.");
                Some(Transition::Recovered)
            }
            (true, false) => {
                warn!("Network FAILED. Link is unreachable.");
                Some(Transition::WentOffline)
            }
        }
    }
}

pub struct HealthMonitor<P = HttpProbe> {
    shared: Arc<Shared<P>>,
    interval: Duration,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl HealthMonitor<HttpProbe> {
    pub fn from_config(config: &MonitorConfig) -> Result<Self, MonitorError> {
        Ok(Self::new(HttpProbe::new(config)?, config.interval()))
    }
}

impl<P: Probe> HealthMonitor<P> {
    /// Starts optimistic: `status()` is `true` until a probe says otherwise.
    pub fn new(probe: P, interval: Duration) -> Self {
        let (online, _) = watch::channel(true);
        Self {
            shared: Arc::new(Shared { probe, online }),
            interval,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Spawns the probe loop. Must be called from within a tokio runtime and
    /// at most once per monitor; a stopped monitor cannot be restarted.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.cancel.is_cancelled() {
            return Err(MonitorError::Stopped);
        }
        if self.task.is_some() {
            return Err(MonitorError::AlreadyStarted);
        }

        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();
        let interval = self.interval;
        self.task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = shared.check() => {}
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!("health monitor loop exited");
        }));

        info!("Network health monitor started (every {:?})", self.interval);
        Ok(())
    }

    pub fn status(&self) -> bool {
        *self.shared.online.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shared.online.subscribe()
    }

    /// Runs one probe cycle on the caller's task, without sleeping.
    pub async fn probe_once(&self) -> Option<Transition> {
        self.shared.check().await
    }

    /// Requests termination without waiting for the loop to exit.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("health monitor task ended abnormally: {}", e);
            }
        }
    }
}

impl<P> Drop for HealthMonitor<P> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
