//! Periodic trigger for the update check

use refit_core::RefitConfig;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::checker::CheckReport;
use crate::error::Result;

/// Job id the check is registered under
pub const CHECK_JOB_ID: &str = "refit_updater";

/// Runs a check job on a fixed interval
#[derive(Debug, Clone)]
pub struct CheckSchedule {
    job_id: String,
    interval: Duration,
}

impl CheckSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            job_id: CHECK_JOB_ID.to_string(),
            interval,
        }
    }

    pub fn from_config(config: &RefitConfig) -> Self {
        Self::new(config.check_interval())
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `job` now and then every interval until `shutdown` resolves
    ///
    /// Runs never overlap: the next tick is only awaited once the previous
    /// run has finished. Job errors are logged and the schedule continues.
    /// Returns the number of runs.
    pub async fn run_until<F, Fut, S>(&self, mut job: F, shutdown: S) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<CheckReport>>,
        S: Future<Output = ()>,
    {
        info!(
            "Scheduling job '{}' every {}s",
            self.job_id,
            self.interval.as_secs()
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut runs = 0;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping job '{}' after {} run(s)", self.job_id, runs);
                    break;
                }
                _ = ticker.tick() => {
                    runs += 1;
                    if let Err(e) = job().await {
                        error!("Job '{}' failed: {}", self.job_id, e);
                    }
                }
            }
        }

        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU64, Ordering};

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_interval() {
        let schedule = CheckSchedule::new(HOUR);
        let calls = AtomicU64::new(0);

        let runs = schedule
            .run_until(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, Error>(CheckReport::default()) }
                },
                tokio::time::sleep(HOUR * 3 + Duration::from_secs(1)),
            )
            .await;

        assert_eq!(runs, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_runs_do_not_stop_schedule() {
        let schedule = CheckSchedule::new(HOUR);

        let runs = schedule
            .run_until(
                || async { Err::<CheckReport, _>(Error::state_store("disk full")) },
                tokio::time::sleep(HOUR + Duration::from_secs(1)),
            )
            .await;

        assert_eq!(runs, 2);
    }

    #[test]
    fn test_job_id() {
        let schedule = CheckSchedule::new(HOUR);
        assert_eq!(schedule.job_id(), "refit_updater");
        assert_eq!(schedule.interval(), HOUR);
    }
}
