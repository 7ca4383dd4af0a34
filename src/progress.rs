use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

/// Percent of `total` reached by `current`, capped at 100. `None` when the
/// total is unknown.
pub fn percent_complete(current: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some((current as f64 / total as f64 * 100.0).min(100.0))
}

/// Bytes per second over `elapsed`.
pub fn throughput(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 / secs
}

/// Progress line for a single attempt. Speed only counts bytes received
/// since this attempt began.
pub struct AttemptProgress {
    pb: ProgressBar,
    name: String,
    started: Instant,
    attempt_bytes: u64,
    total: u64,
}

impl AttemptProgress {
    pub fn start(name: &str, total: u64, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr_with_hz(5)
        } else {
            ProgressDrawTarget::hidden()
        };
        let pb = ProgressBar::with_draw_target(None, target);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        Self {
            pb,
            name: name.to_string(),
            started: Instant::now(),
            attempt_bytes: 0,
            total,
        }
    }

    pub fn record(&mut self, chunk_len: u64, bytes_on_disk: u64) {
        self.attempt_bytes += chunk_len;
        let speed = throughput(self.attempt_bytes, self.started.elapsed());
        let percent = match percent_complete(bytes_on_disk, self.total) {
            Some(p) => format!("{:>6.2}%", p),
            None => "    --%".to_string(),
        };
        self.pb.set_message(format!(
            "{} {} | {} / {} | {}/s",
            self.name,
            percent,
            HumanBytes(bytes_on_disk),
            HumanBytes(self.total),
            HumanBytes(speed as u64),
        ));
        self.pb.tick();
    }
}

impl Drop for AttemptProgress {
    fn drop(&mut self) {
        self.pb.finish_and_clear();
    }
}
