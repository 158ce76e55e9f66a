use crate::actor::WeakActorClient;
use crate::api::{ElectionNodeHandle, NodeJob};
use crate::election::timers::time::{Clock, RealClock};
use crate::election::NodeId;
use crate::shutdown::NodeShutdownSignal;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

/// NodeJobTicker runs the node job every `interval` for as long as the node runs, whatever its
/// role. The first run happens one interval after start.
pub(crate) struct NodeJobTicker<C: Clock = RealClock> {
    logger: slog::Logger,
    node_id: NodeId,
    interval: Duration,
    actor_client: WeakActorClient,
    job: Arc<dyn NodeJob>,
    clock: C,
    shutdown: NodeShutdownSignal,
}

impl NodeJobTicker {
    pub(crate) fn new(
        logger: slog::Logger,
        node_id: NodeId,
        interval: Duration,
        actor_client: WeakActorClient,
        job: Arc<dyn NodeJob>,
        shutdown: NodeShutdownSignal,
    ) -> Self {
        Self::with_clock(logger, node_id, interval, actor_client, job, shutdown, RealClock)
    }
}

impl<C: Clock> NodeJobTicker<C> {
    fn with_clock(
        logger: slog::Logger,
        node_id: NodeId,
        interval: Duration,
        actor_client: WeakActorClient,
        job: Arc<dyn NodeJob>,
        shutdown: NodeShutdownSignal,
        clock: C,
    ) -> Self {
        NodeJobTicker {
            logger,
            node_id,
            interval,
            actor_client,
            job,
            clock,
            shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            let next_tick: Instant = self.clock.now() + self.interval;
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => return,
                _ = self.clock.sleep_until(next_tick) => {}
            }

            let actor_client = match self.actor_client.upgrade() {
                Some(client) => client,
                None => return,
            };
            let node = ElectionNodeHandle::new(self.node_id.clone(), actor_client);

            match self.job.run(&node).await {
                Ok(()) => slog::debug!(self.logger, "Node job completed."),
                Err(e) => slog::warn!(self.logger, "Node job failed: {}", e),
            }
        }
    }
}
