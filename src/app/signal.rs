use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SLEEP_SLICE: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleeps in short slices so shutdown is noticed quickly. Returns false if stopped.
    pub fn sleep(&self, duration: Duration) -> bool {
        // A deadline past what Instant can represent means "until stopped".
        let deadline = Instant::now().checked_add(duration);
        loop {
            if self.is_set() {
                return false;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return true;
                    }
                    (deadline - now).min(SLEEP_SLICE)
                }
                None => SLEEP_SLICE,
            };
            std::thread::sleep(slice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn clones_share_the_flag() {
        let stop = StopSignal::new();
        let other = stop.clone();
        assert!(!other.is_set());
        stop.set();
        assert!(other.is_set());
    }

    #[test]
    fn sleep_runs_full_duration_when_not_stopped() {
        let stop = StopSignal::new();
        let started = Instant::now();
        assert!(stop.sleep(Duration::from_millis(60)));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn unrepresentable_duration_sleeps_until_stopped() {
        let stop = StopSignal::new();
        let setter = stop.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            setter.set();
        });
        assert!(!stop.sleep(Duration::MAX));
        handle.join().expect("join");
    }

    #[test]
    fn sleep_returns_early_on_stop() {
        let stop = StopSignal::new();
        let setter = stop.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            setter.set();
        });
        let started = Instant::now();
        assert!(!stop.sleep(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(2));
        handle.join().expect("join");
    }
}
