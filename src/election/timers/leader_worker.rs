use crate::actor::WeakActorClient;
use crate::api::{ElectionNodeHandle, LeaderJob};
use crate::election::timers::stop_signal::{self, StopCheck, Stopper};
use crate::election::timers::time::{Clock, RealClock};
use crate::election::timers::LeaderHeartbeatTick;
use crate::election::NodeId;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

pub(crate) struct LeaderWorkerConfig {
    pub logger: slog::Logger,
    pub node_id: NodeId,
    pub leadership: u64,
    pub heartbeat_interval: Duration,
    pub submit_interval: Duration,
    pub actor_client: WeakActorClient,
    pub leader_job: Arc<dyn LeaderJob>,
}

/// LeaderWorkerHandle is alive exactly as long as this node leads. Behind it run two tasks: a
/// heartbeat ticker asking the actor to broadcast a heartbeat, and a submit ticker running the
/// leader job. Both start with an immediate tick and stop on `resign()` or drop.
pub(crate) struct LeaderWorkerHandle {
    stopper: Stopper,
}

impl LeaderWorkerHandle {
    pub(crate) fn spawn(config: LeaderWorkerConfig) -> Self {
        let (heartbeat_task, submit_task, handle) = new_worker(config, RealClock);
        tokio::task::spawn(heartbeat_task.run());
        tokio::task::spawn(submit_task.run());

        handle
    }

    pub(crate) fn resign(&self) {
        self.stopper.stop();
    }
}

struct HeartbeatTask<C: Clock> {
    tick: LeaderHeartbeatTick,
    interval: Duration,
    actor_client: WeakActorClient,
    clock: C,
    stop_check: StopCheck,
}

struct SubmitTask<C: Clock> {
    logger: slog::Logger,
    node_id: NodeId,
    interval: Duration,
    actor_client: WeakActorClient,
    leader_job: Arc<dyn LeaderJob>,
    clock: C,
    stop_check: StopCheck,
}

fn new_worker<C: Clock>(config: LeaderWorkerConfig, clock: C) -> (HeartbeatTask<C>, SubmitTask<C>, LeaderWorkerHandle) {
    let (stopper, stop_check) = stop_signal::new();

    let heartbeat_task = HeartbeatTask {
        tick: LeaderHeartbeatTick {
            leadership: config.leadership,
        },
        interval: config.heartbeat_interval,
        actor_client: config.actor_client.clone(),
        clock: clock.clone(),
        stop_check: stop_check.clone(),
    };
    let submit_task = SubmitTask {
        logger: config.logger,
        node_id: config.node_id,
        interval: config.submit_interval,
        actor_client: config.actor_client,
        leader_job: config.leader_job,
        clock,
        stop_check,
    };

    (heartbeat_task, submit_task, LeaderWorkerHandle { stopper })
}

impl<C: Clock> HeartbeatTask<C> {
    async fn run(mut self) {
        // First tick is immediate so followers hear from a new leader as soon as possible.
        loop {
            if self.stop_check.should_stop() {
                return;
            }
            if self.actor_client.leader_heartbeat_tick(self.tick).await.is_err() {
                return;
            }

            // Measured from after the tick was delivered. A long stall yields one tick, not a burst.
            let next_tick: Instant = self.clock.now() + self.interval;
            tokio::select! {
                biased;
                _ = self.stop_check.stopped() => return,
                _ = self.clock.sleep_until(next_tick) => {}
            }
        }
    }
}

impl<C: Clock> SubmitTask<C> {
    async fn run(mut self) {
        loop {
            if self.stop_check.should_stop() {
                return;
            }

            let actor_client = match self.actor_client.upgrade() {
                Some(client) => client,
                None => return,
            };
            let node = ElectionNodeHandle::new(self.node_id.clone(), actor_client);

            // An in-flight job is allowed to finish after we resign. Its outcome never affects the
            // election.
            match self.leader_job.run(&node).await {
                Ok(()) => slog::debug!(self.logger, "Leader job completed."),
                Err(e) => slog::warn!(self.logger, "Leader job failed: {}", e),
            }
            drop(node);

            tokio::select! {
                biased;
                _ = self.stop_check.stopped() => return,
                _ = self.clock.sleep(self.interval) => {}
            }
        }
    }
}
