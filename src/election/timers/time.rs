use tokio::sync::watch;
use tokio::time::{Duration, Instant};

/// Clock lets timer tasks run against real tokio time in production and against a manually
/// advanced clock in tests.
#[async_trait::async_trait]
pub(crate) trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;

    async fn sleep_until(&mut self, deadline: Instant);

    async fn sleep(&mut self, duration: Duration) {
        let deadline = self.now() + duration;
        self.sleep_until(deadline).await;
    }
}

#[derive(Copy, Clone)]
pub(crate) struct RealClock;

#[async_trait::async_trait]
impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
pub(crate) fn mocked_clock() -> (MockClock, MockClockController) {
    let start = Instant::now();
    let (tx, rx) = watch::channel(start);

    (MockClock { now: rx }, MockClockController { now: tx, start })
}

/// MockClock only moves when its controller says so.
#[cfg(test)]
#[derive(Clone)]
pub(crate) struct MockClock {
    now: watch::Receiver<Instant>,
}

#[cfg(test)]
#[async_trait::async_trait]
impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.now.borrow()
    }

    async fn sleep_until(&mut self, deadline: Instant) {
        while *self.now.borrow() < deadline {
            self.now.changed().await.expect("MockClockController dropped");
        }
    }
}

#[cfg(test)]
pub(crate) struct MockClockController {
    now: watch::Sender<Instant>,
    start: Instant,
}

#[cfg(test)]
impl MockClockController {
    pub(crate) fn elapsed_time(&self) -> Duration {
        *self.now.borrow() - self.start
    }

    /// A sleeper only promises to wake at or after its deadline. Advance in steps smaller than
    /// what the test wants to observe, or several deadlines collapse into one wake up.
    pub(crate) fn advance(&mut self, duration: Duration) {
        let new_now = *self.now.borrow() + duration;
        self.now.send(new_now).expect("MockClock dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn mock_clock_wakes_sleepers_only_when_advanced() {
        let step = Duration::from_millis(250);
        let (woke_tx, mut woke_rx) = mpsc::unbounded_channel();
        let (mut clock, mut controller) = mocked_clock();
        let mut next_wake = clock.now();

        tokio::spawn(async move {
            loop {
                next_wake += step;
                clock.sleep_until(next_wake).await;
                if woke_tx.send(clock.now()).is_err() {
                    return;
                }
            }
        });

        // Real time passing has no effect.
        tokio::time::timeout(step * 2, woke_rx.recv())
            .await
            .expect_err("Expected timeout");

        controller.advance(step / 2);
        tokio::time::timeout(Duration::from_millis(20), woke_rx.recv())
            .await
            .expect_err("Expected timeout");

        controller.advance(step / 2);
        woke_rx.recv().await.unwrap();

        controller.advance(step);
        woke_rx.recv().await.unwrap();

        assert_eq!(controller.elapsed_time(), step * 2);
    }
}
