use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use log::{error, info, warn};
use permit_scan::{CheckOutcome, PermitChecker, ScanError, ScheduleConfig};
use tokio::time::{MissedTickBehavior, interval, timeout};

/// A single availability check the scheduler can drive
#[async_trait]
pub trait AvailabilityCheck: Send + Sync {
    /// Run the check to completion
    async fn run_check(&self) -> Result<CheckOutcome, ScanError>;
}

#[async_trait]
impl AvailabilityCheck for PermitChecker {
    async fn run_check(&self) -> Result<CheckOutcome, ScanError> {
        PermitChecker::run_check(self).await
    }
}

/// Drives checks on a fixed interval, each bounded by a timeout
pub struct CheckScheduler {
    check: Arc<dyn AvailabilityCheck>,
    schedule: ScheduleConfig,
}

impl CheckScheduler {
    /// Create a scheduler for `check`
    pub fn new(check: Arc<dyn AvailabilityCheck>, schedule: ScheduleConfig) -> Self {
        Self { check, schedule }
    }

    /// Run one check, failing if it does not finish within the configured timeout.
    ///
    /// A timed-out check is dropped mid-flight; writes already issued may or may
    /// not have landed and the next check reconciles them.
    pub async fn run_once(&self) -> anyhow::Result<CheckOutcome> {
        let limit = self.schedule.check_timeout;
        match timeout(limit, self.check.run_check()).await {
            Ok(result) => Ok(result?),
            Err(_) => anyhow::bail!("Check timed out after {}s", limit.as_secs()),
        }
    }

    /// Check on every tick until `shutdown` resolves; returns the number of checks run.
    ///
    /// Failures are logged and do not stop the loop. Ticks missed while a check
    /// is running are skipped, so checks never overlap.
    pub async fn run<F>(&self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        info!(
            "⏱️ Checking every {}s (timeout {}s)",
            self.schedule.check_interval.as_secs(),
            self.schedule.check_timeout.as_secs()
        );

        let mut ticker = interval(self.schedule.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut checks = 0;
        let mut consecutive_failures: u32 = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("🛑 Shutdown requested, stopping checks");
                    break;
                }
                _ = ticker.tick() => {}
            }

            checks += 1;
            match self.run_once().await {
                Ok(outcome) => {
                    if consecutive_failures > 0 {
                        info!("✅ Check recovered after {} failures", consecutive_failures);
                    }
                    consecutive_failures = 0;
                    info!("✅ Check finished: {:?}", outcome);
                }
                Err(e) => {
                    consecutive_failures += 1;
                    error!("❌ Check failed: {:#}", e);
                    if consecutive_failures >= 5 {
                        warn!("⚠️ {} consecutive checks have failed", consecutive_failures);
                    }
                }
            }
        }

        checks
    }
}
