use rand::Rng;
use std::ops::RangeInclusive;
use tokio::time::Duration;

/// TimingPolicy holds every duration the election protocol runs on. Election timeouts are
/// expressed as multiples of the heartbeat interval so the two can't drift apart.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct TimingPolicy {
    pub heartbeat_interval: Duration,
    pub election_timeout_min_multiplier: u32,
    pub election_timeout_max_multiplier: u32,
    pub submit_interval: Duration,
}

impl TimingPolicy {
    pub(crate) fn election_timeout_range(&self) -> RangeInclusive<Duration> {
        RangeInclusive::new(
            self.heartbeat_interval * self.election_timeout_min_multiplier,
            self.heartbeat_interval * self.election_timeout_max_multiplier,
        )
    }

    /// Random jitter makes it unlikely that several followers time out at once and split the vote.
    pub(crate) fn election_timeout(&self) -> Duration {
        rand::thread_rng().gen_range(self.election_timeout_range())
    }

    /// A candidate never counts its own vote, and `subscriber_count` excludes self. So this is a
    /// strict majority of the peers we can currently see on the topic.
    pub(crate) fn has_quorum(votes_received: usize, subscriber_count: usize) -> bool {
        votes_received > subscriber_count / 2
    }
}
