//! Fixed-size worker pool.
//!
//! Starts `worker_count` independent workers against one relay address.
//! Workers share nothing; the relay alone decides which channel carries
//! which instruction. Each worker runs under a small supervision loop so
//! a dropped channel does not silently reduce pool capacity forever.

use crate::error::{Error, Result};
use crate::worker::Worker;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

pub struct Pool {
    pub relay_url: String,
    pub worker_count: usize,
    pub request_timeout: Duration,
    pub idle_timeout: Option<Duration>,
}

impl Pool {
    /// Launches all workers and returns their task handles without
    /// waiting: workers run until aborted. Worker ordinals are assigned
    /// 0..worker_count and exist only for log correlation.
    pub fn start(&self) -> Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::with_capacity(self.worker_count);
        for id in 0..self.worker_count {
            let worker = Worker::new(
                id,
                self.relay_url.clone(),
                self.request_timeout,
                self.idle_timeout,
            )?;
            info!("starting worker #{:03}", id);
            handles.push(tokio::spawn(supervise(worker)));
        }
        Ok(handles)
    }
}

/// Runs one worker forever, reconnecting after each session ends.
/// Any session that reached the connected state resets the delay to
/// [`INITIAL_BACKOFF`]; only consecutive connect failures escalate it,
/// doubling up to [`MAX_BACKOFF`].
async fn supervise(worker: Worker) {
    let mut delay = INITIAL_BACKOFF;
    loop {
        match worker.run().await {
            Ok(()) => {
                info!("#{:03} session ended, reconnecting", worker.id());
                delay = INITIAL_BACKOFF;
            }
            Err(e) => {
                if !matches!(e, Error::Connect(_)) {
                    delay = INITIAL_BACKOFF;
                }
                error!(
                    "#{:03} session failed: {}, reconnecting in {}s",
                    worker.id(),
                    e,
                    delay.as_secs()
                );
            }
        }
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(MAX_BACKOFF);
    }
}
