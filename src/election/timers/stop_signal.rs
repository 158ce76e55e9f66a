use tokio::sync::watch;

/// Stopper is the sending half of a one-shot stop notification shared by several tasks. Calling
/// `stop()` more than once is harmless, and dropping the Stopper stops too.
pub(super) struct Stopper {
    signal: watch::Sender<bool>,
}

#[derive(Clone)]
pub(super) struct StopCheck {
    signal: watch::Receiver<bool>,
}

pub(super) fn new() -> (Stopper, StopCheck) {
    let (tx, rx) = watch::channel(false);

    (Stopper { signal: tx }, StopCheck { signal: rx })
}

impl Stopper {
    pub(super) fn stop(&self) {
        // Only fails when every StopCheck is gone, which means nobody is left to stop.
        let _ = self.signal.send(true);
    }
}

impl Drop for Stopper {
    fn drop(&mut self) {
        self.stop();
    }
}

impl StopCheck {
    pub(super) fn should_stop(&self) -> bool {
        *self.signal.borrow()
    }

    pub(super) async fn stopped(&mut self) {
        while !self.should_stop() {
            if self.signal.changed().await.is_err() {
                return;
            }
        }
    }
}
