//! Polling for WeCom background jobs.
//!
//! Some operations don't finish within the request that starts them
//! (publishing a moment task, translating contact IDs in a file). They
//! follow the same pattern:
//!
//! 1. **POST** to start the job, which returns a `jobid`.
//! 2. **Poll** a result endpoint with that `jobid` until `status` reports
//!    the job finished (`1` started, `2` running, `3` finished).
//!
//! This module provides [`JobStatus`], [`PollConfig`] and the reusable
//! [`poll_job`] loop so each endpoint family doesn't re-implement it.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{Result, WecomError};

/// Lifecycle status of a background job.
///
/// `Unknown` keeps deserialization working if WeCom adds status values;
/// the polling loop treats it as non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum JobStatus {
    Started,
    Running,
    Finished,
    Unknown(i64),
}

impl From<i64> for JobStatus {
    fn from(value: i64) -> Self {
        match value {
            1 => JobStatus::Started,
            2 => JobStatus::Running,
            3 => JobStatus::Finished,
            other => JobStatus::Unknown(other),
        }
    }
}

impl From<JobStatus> for i64 {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Started => 1,
            JobStatus::Running => 2,
            JobStatus::Finished => 3,
            JobStatus::Unknown(other) => other,
        }
    }
}

/// A job result that reports its own status.
pub trait JobState {
    fn job_status(&self) -> JobStatus;
}

/// Controls how long and how often [`poll_job`] waits.
///
/// Defaults: 2 seconds between polls, 5 minutes overall. Moment tasks
/// usually finish in a few seconds; large ID translation files can take
/// minutes.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before each poll request.
    pub interval: Duration,
    /// Maximum total time spent polling, measured from the first poll.
    pub timeout: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        PollConfig { interval, timeout }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Calls `fetch` until the returned result reports [`JobStatus::Finished`].
///
/// # Errors
///
/// - `WecomError::Timeout` once `config.timeout` has elapsed without the
///   job finishing.
/// - Any error returned by `fetch`, unchanged.
pub async fn poll_job<T, F, Fut>(job_id: &str, config: &PollConfig, mut fetch: F) -> Result<T>
where
    T: JobState,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let started = Instant::now();

    loop {
        tokio::time::sleep(config.interval).await;

        // Check before sending, so we don't issue a request we already
        // know we can't wait for.
        if started.elapsed() > config.timeout {
            return Err(WecomError::Timeout {
                elapsed: started.elapsed(),
                job_id: job_id.to_string(),
            });
        }

        let result = fetch().await?;
        match result.job_status() {
            JobStatus::Finished => return Ok(result),
            status => {
                tracing::debug!(job_id, ?status, "job not finished yet");
            }
        }
    }
}
