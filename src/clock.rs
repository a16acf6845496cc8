//! Cached microsecond clock backing the scanner's deadline checks.
//!
//! The scanner polls its deadline every 128 input bytes; a syscall per poll
//! would dominate the scan. Instead a background thread refreshes a shared
//! `AtomicU64` roughly once per millisecond and readers do a single atomic
//! load. Accuracy of about one tick is adequate for budget enforcement.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(1);

/// Monotonic microsecond counter refreshed by a background tick thread.
///
/// Values are microseconds elapsed since [`Clock::start`]; only differences
/// are meaningful. Dropping the clock stops the tick thread.
pub(crate) struct Clock {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

struct Shared {
    micros: AtomicU64,
    shutdown: AtomicBool,
}

impl Clock {
    pub(crate) fn start() -> Self {
        let shared = Arc::new(Shared {
            micros: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        });
        let origin = Instant::now();
        let ticker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("masker-clock".into())
            .spawn(move || {
                while !ticker.shutdown.load(Ordering::Acquire) {
                    let elapsed = origin.elapsed().as_micros() as u64;
                    ticker.micros.store(elapsed, Ordering::Release);
                    thread::sleep(TICK);
                }
            })
            .expect("spawn masker clock thread");

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Returns the cached microseconds elapsed since the clock started.
    #[inline]
    pub(crate) fn now_micros(&self) -> i64 {
        self.shared.micros.load(Ordering::Acquire) as i64
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_within_a_few_ticks() {
        let clock = Clock::start();
        let first = clock.now_micros();
        thread::sleep(Duration::from_millis(50));
        let later = clock.now_micros();
        assert!(later >= first);
        assert!(later - first >= 10_000, "clock barely moved: {later}");
    }

    #[test]
    fn drop_stops_the_tick_thread() {
        let clock = Clock::start();
        let shared = Arc::clone(&clock.shared);
        drop(clock);
        assert!(shared.shutdown.load(Ordering::Acquire));
    }
}
