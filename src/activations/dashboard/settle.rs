use super::controller::ServiceControl;
use super::secret::UnitInstance;
use super::types::ServiceStatus;
use crate::config::TimingConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Floor for the poll interval so a zero setting cannot spin
const MIN_POLL: Duration = Duration::from_millis(10);

/// Bounded wait for a start or stop request to become visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl SettlePolicy {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            poll_interval,
            max_wait,
        }
    }

    /// Query once, never wait
    pub fn immediate() -> Self {
        Self::new(MIN_POLL, Duration::ZERO)
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.settle_poll(), timing.settle_max())
    }

    /// Poll until the unit reports `target` or the window closes
    ///
    /// Returns the last status observed, which differs from `target` only
    /// when the window ran out.
    pub async fn settle(
        &self,
        control: &dyn ServiceControl,
        unit: &UnitInstance,
        target: ServiceStatus,
    ) -> ServiceStatus {
        let deadline = Instant::now() + self.max_wait;
        let poll = self.poll_interval.max(MIN_POLL);
        loop {
            let observed = control.status(unit).await;
            if observed == target {
                return observed;
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::debug!("Gave up waiting for {:?} after {:?}", target, self.max_wait);
                return observed;
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
        }
    }
}
