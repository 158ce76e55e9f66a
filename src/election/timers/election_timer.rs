use crate::actor::WeakActorClient;
use crate::election::timers::time::{Clock, RealClock};
use crate::election::timers::ElectionTimeout;
use crate::election::TimingPolicy;
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

#[derive(Copy, Clone, Debug)]
struct Deadline {
    wake_at: Instant,
    epoch: u64,
}

/// ElectionTimerHandle owns the single-shot election timeout of a follower or candidate. Every
/// reset draws a fresh random timeout and tags it with the caller's epoch, so the actor can tell a
/// timeout that was already queued before the reset apart from a real one. Dropping the handle
/// stops the timer task.
pub(crate) struct ElectionTimerHandle<C: Clock = RealClock> {
    deadline: watch::Sender<Deadline>,
    policy: TimingPolicy,
    clock: C,
}

struct ElectionTimerTask<C: Clock> {
    deadline: watch::Receiver<Deadline>,
    actor_client: WeakActorClient,
    clock: C,
    // Pause between repeated timeouts when the actor doesn't reset us, so a busy actor isn't
    // flooded with timeout events.
    backoff: Duration,
}

impl ElectionTimerHandle {
    pub(crate) fn spawn_timer_task(policy: TimingPolicy, epoch: u64, actor_client: WeakActorClient) -> Self {
        let (task, handle) = ElectionTimerTask::new(policy, epoch, actor_client, RealClock);
        tokio::task::spawn(task.run());

        handle
    }
}

impl<C: Clock> ElectionTimerHandle<C> {
    pub(crate) fn reset_timeout(&self, epoch: u64) {
        let _ = self.deadline.send(self.random_deadline(epoch));
    }

    fn random_deadline(&self, epoch: u64) -> Deadline {
        Deadline {
            wake_at: self.clock.now() + self.policy.election_timeout(),
            epoch,
        }
    }
}

impl<C: Clock> ElectionTimerTask<C> {
    fn new(
        policy: TimingPolicy,
        epoch: u64,
        actor_client: WeakActorClient,
        clock: C,
    ) -> (Self, ElectionTimerHandle<C>) {
        // The first deadline must be in place before the task starts, otherwise it would fire
        // right away.
        let first = Deadline {
            wake_at: clock.now() + policy.election_timeout(),
            epoch,
        };
        let (tx, rx) = watch::channel(first);

        let task = ElectionTimerTask {
            deadline: rx,
            actor_client,
            clock: clock.clone(),
            backoff: *policy.election_timeout_range().start(),
        };
        let handle = ElectionTimerHandle {
            deadline: tx,
            policy,
            clock,
        };

        (task, handle)
    }

    async fn run(mut self) {
        loop {
            let Deadline { wake_at, epoch } = *self.deadline.borrow_and_update();

            tokio::select! {
                biased;
                changed = self.deadline.changed() => {
                    if changed.is_err() {
                        // Handle dropped: no longer follower or candidate.
                        return;
                    }
                    continue;
                }
                _ = self.clock.sleep_until(wake_at) => {}
            }

            if self.actor_client.election_timeout(ElectionTimeout { epoch }).await.is_err() {
                return;
            }

            // A reset cuts the backoff short.
            tokio::select! {
                biased;
                changed = self.deadline.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = self.clock.sleep(self.backoff) => {}
            }
        }
    }
}
