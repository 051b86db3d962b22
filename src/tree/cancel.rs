use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag a caller can raise to stop a running build.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Checked by the builders between split evaluations.
#[derive(Debug, Clone, Default)]
pub(crate) struct StopCondition {
    flag: Option<CancelFlag>,
    deadline: Option<Instant>,
}

impl StopCondition {
    pub(crate) fn new(flag: Option<CancelFlag>, time_budget: Option<Duration>) -> Self {
        Self {
            flag,
            // A budget too large to represent never expires
            deadline: time_budget.and_then(|budget| Instant::now().checked_add(budget)),
        }
    }

    pub(crate) fn should_stop(&self) -> bool {
        self.flag.as_ref().is_some_and(CancelFlag::is_cancelled)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let stop = StopCondition::new(Some(flag.clone()), None);
        assert!(!stop.should_stop());
        flag.cancel();
        assert!(stop.should_stop());
    }

    #[test]
    fn test_zero_budget_stops_immediately() {
        let stop = StopCondition::new(None, Some(Duration::ZERO));
        assert!(stop.should_stop());
        assert!(!StopCondition::default().should_stop());
    }
}
