use crate::api::CustomMessageHandler;
use crate::message::CustomMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

pub(crate) fn new() -> (CustomMessageDispatcher, CustomMessageQueue) {
    let (tx, rx) = mpsc::unbounded_channel();

    (CustomMessageDispatcher { sender: tx }, CustomMessageQueue { receiver: rx })
}

/// CustomMessageDispatcher hands application-defined messages to a worker so a slow handler never
/// blocks the election.
pub(crate) struct CustomMessageDispatcher {
    sender: mpsc::UnboundedSender<CustomMessage>,
}

impl CustomMessageDispatcher {
    pub(crate) fn dispatch(&self, message: CustomMessage) -> bool {
        self.sender.send(message).is_ok()
    }
}

pub(crate) struct CustomMessageQueue {
    receiver: mpsc::UnboundedReceiver<CustomMessage>,
}

impl CustomMessageQueue {
    #[cfg(test)]
    pub(crate) fn try_recv(&mut self) -> Option<CustomMessage> {
        self.receiver.try_recv().ok()
    }
}

/// Awaits the handler once per message, in arrival order. Handler errors are logged only.
pub(crate) async fn run_custom_message_worker(
    logger: slog::Logger,
    handler: Option<Arc<dyn CustomMessageHandler>>,
    mut queue: CustomMessageQueue,
) {
    while let Some(message) = queue.receiver.recv().await {
        let handler = match &handler {
            Some(handler) => handler,
            None => {
                slog::debug!(
                    logger,
                    "No handler registered, dropping '{}' message from {}",
                    message.message_type,
                    message.sent_from
                );
                continue;
            }
        };

        let message_type = message.message_type.clone();
        if let Err(e) = handler.handle(message).await {
            slog::warn!(logger, "Custom message handler failed on '{}': {}", message_type, e);
        }
    }
}
