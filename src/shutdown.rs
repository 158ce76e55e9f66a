use tokio::sync::watch;

/// Creates the pair used to stop every long running task of one election node. Shutdown fires
/// when `shutdown()` is called or when the handle is dropped, whichever happens first.
pub(crate) fn shutdown_signal() -> (NodeShutdownHandle, NodeShutdownSignal) {
    let (tx, rx) = watch::channel(false);

    (NodeShutdownHandle { tx }, NodeShutdownSignal { rx })
}

pub(crate) struct NodeShutdownHandle {
    tx: watch::Sender<bool>,
}

impl NodeShutdownHandle {
    pub(crate) fn shutdown(self) {
        // Drop does the work.
    }
}

impl Drop for NodeShutdownHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Clone)]
pub(crate) struct NodeShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl NodeShutdownSignal {
    /// Resolves once shutdown has been requested. Safe to call again afterwards, it returns
    /// immediately.
    pub(crate) async fn wait(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            // We don't care if the handle sent a value or dropped.
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
