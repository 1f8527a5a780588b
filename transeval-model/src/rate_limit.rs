use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

const WINDOW: Duration = Duration::from_secs(60);
const MIN_SLEEP: Duration = Duration::from_millis(50);

struct Window {
    /// (admitted_at, token_cost) for every request still inside the window.
    entries: VecDeque<(Instant, u32)>,
    tokens_in_window: u64,
}

impl Window {
    fn new() -> Self {
        Window {
            entries: VecDeque::new(),
            tokens_in_window: 0,
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&(admitted_at, cost)) = self.entries.front() {
            if now.duration_since(admitted_at) >= WINDOW {
                self.entries.pop_front();
                self.tokens_in_window -= u64::from(cost);
            } else {
                break;
            }
        }
    }

    fn requests(&self) -> usize {
        self.entries.len()
    }
}

/// Sliding 60-second window rate limiter with independent RPM and TPM budgets
/// (§4.3). Callers wait on a [`Notify`] rather than a fixed sleep loop so a
/// freed slot wakes admission immediately instead of after a blind poll
/// interval (§9's condition-variable guidance).
pub struct RateLimiter {
    rpm: Option<u32>,
    tpm: Option<u32>,
    window: Mutex<Window>,
    notify: Notify,
}

impl RateLimiter {
    pub fn new(rpm: Option<u32>, tpm: Option<u32>) -> Self {
        RateLimiter {
            rpm,
            tpm,
            window: Mutex::new(Window::new()),
            notify: Notify::new(),
        }
    }

    /// Blocks until a call of `cost` tokens may proceed, then records the
    /// admission. Unbounded budgets (`None`) never block on that dimension.
    pub async fn admit(&self, cost: u32) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                window.prune(now);

                let rpm_ok = self.rpm.map_or(true, |rpm| (window.requests() as u32) < rpm);
                let tpm_ok = self
                    .tpm
                    .map_or(true, |tpm| window.tokens_in_window + u64::from(cost) <= u64::from(tpm));

                if rpm_ok && tpm_ok {
                    window.entries.push_back((now, cost));
                    window.tokens_in_window += u64::from(cost);
                    None
                } else {
                    Some(self.time_until_slot_frees(&window, now))
                }
            };

            match wait {
                None => return,
                Some(delay) => {
                    let delay = delay.max(MIN_SLEEP);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.notify.notified() => {}
                    }
                }
            }
        }
    }

    fn time_until_slot_frees(&self, window: &Window, now: Instant) -> Duration {
        match window.entries.front() {
            Some(&(admitted_at, _)) => {
                let elapsed = now.duration_since(admitted_at);
                WINDOW.saturating_sub(elapsed)
            }
            None => MIN_SLEEP,
        }
    }
}
