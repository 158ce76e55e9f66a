use crate::actor::ActorClient;
use crate::gossip::GossipSubscription;
use crate::message;
use crate::shutdown::NodeShutdownSignal;
use tokio::time::Duration;

const FIRST_ERROR_BACKOFF: Duration = Duration::from_millis(10);
const MAX_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Doubles with every consecutive transport error, capped at MAX_ERROR_BACKOFF.
fn error_backoff(consecutive_errors: u32) -> Duration {
    let doublings = consecutive_errors.saturating_sub(1).min(16);
    (FIRST_ERROR_BACKOFF * 2u32.pow(doublings)).min(MAX_ERROR_BACKOFF)
}

/// Pulls raw payloads off the topic, decodes them and pushes them into the actor queue. The queue
/// is bounded, so a burst of gossip makes this task wait instead of growing memory.
pub(crate) async fn run_subscription_reader(
    logger: slog::Logger,
    mut subscription: Box<dyn GossipSubscription>,
    actor_client: ActorClient,
    mut shutdown: NodeShutdownSignal,
) {
    let mut consecutive_errors: u32 = 0;
    loop {
        let next = tokio::select! {
            next = subscription.next() => next,
            _ = shutdown.wait() => {
                slog::debug!(logger, "Subscription reader shutting down.");
                return;
            }
        };

        let raw = match next {
            Some(Ok(raw)) => {
                consecutive_errors = 0;
                raw
            }
            Some(Err(e)) => {
                consecutive_errors = consecutive_errors.saturating_add(1);
                let backoff = error_backoff(consecutive_errors);
                slog::warn!(logger, "Failed to receive from topic: {}. Retrying in {:?}.", e, backoff);
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => continue,
                    _ = shutdown.wait() => return,
                }
            }
            None => {
                slog::warn!(logger, "Topic subscription closed. No more messages will be received.");
                return;
            }
        };

        let decoded = match message::decode(&raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                slog::warn!(logger, "Dropping undecodable message: {}", e);
                continue;
            }
        };

        if actor_client.inbound(decoded).await.is_err() {
            slog::debug!(logger, "Election node exited, stopping subscription reader.");
            return;
        }
    }
}
