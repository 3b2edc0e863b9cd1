use std::time::Duration;
use triggered::{trigger, Listener, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickReason {
    Wakeup,
    Shutdown,
}

/// A service for coordinating interruptible sleeps. Long-running workers wait
/// through [`TickService::tick`] so that a shutdown request wakes them
/// immediately instead of after the full sleep period.
pub struct TickService {
    shutdown_trigger: Trigger,
    shutdown_listener: Listener,
}

impl Default for TickService {
    fn default() -> Self {
        Self::new()
    }
}

impl TickService {
    pub fn new() -> Self {
        let (shutdown_trigger, shutdown_listener) = trigger();
        Self { shutdown_trigger, shutdown_listener }
    }

    /// Waits for `timeout` to elapse or for shutdown, whichever comes first
    pub async fn tick(&self, timeout: Duration) -> TickReason {
        let listener = self.shutdown_listener.clone();
        tokio::select! {
            biased;
            _ = listener => TickReason::Shutdown,
            _ = tokio::time::sleep(timeout) => TickReason::Wakeup,
        }
    }

    pub fn shutdown(&self) {
        self.shutdown_trigger.trigger()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_tick_wakeup() {
        let service = TickService::new();
        assert_eq!(service.tick(Duration::from_millis(1)).await, TickReason::Wakeup);
    }

    #[tokio::test]
    async fn test_tick_shutdown_interrupts_sleep() {
        let service = TickService::new();
        let start = Instant::now();
        service.shutdown();
        assert_eq!(service.tick(Duration::from_secs(600)).await, TickReason::Shutdown);
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
