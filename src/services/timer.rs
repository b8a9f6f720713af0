use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Countdown for a time-limited session. Ticks once per period, reports the
/// remaining seconds, and fires the expiry callback exactly once at zero,
/// after which the task exits on its own.
///
/// The handle carries an explicit active flag so `stop()` can be called
/// redundantly from both submission paths without error; a stopped timer
/// never ticks or expires again.
pub struct SessionTimer {
    active: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl SessionTimer {
    pub fn start<T, E>(total_seconds: u32, tick_period: Duration, on_tick: T, on_expire: E) -> Self
    where
        T: Fn(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let flag = active.clone();

        let handle = tokio::spawn(async move {
            let mut remaining = total_seconds;
            let mut interval = tokio::time::interval(tick_period);
            // The first interval tick completes immediately; the countdown
            // starts one full period after `start`.
            interval.tick().await;

            while remaining > 0 {
                interval.tick().await;
                if !flag.load(Ordering::SeqCst) {
                    return;
                }
                remaining -= 1;
                on_tick(remaining);
            }

            if flag.swap(false, Ordering::SeqCst) {
                on_expire();
            }
        });

        Self { active, handle }
    }

    /// Cancels all future ticks. Idempotent: stopping an already-stopped or
    /// already-expired timer is a no-op.
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.handle.abort();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
