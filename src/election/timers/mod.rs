mod election_timer;
mod job_ticker;
mod leader_worker;
mod stop_signal;
mod time;

#[cfg(test)]
mod test_utils;

pub(crate) use election_timer::ElectionTimerHandle;
pub(crate) use job_ticker::NodeJobTicker;
pub(crate) use leader_worker::LeaderWorkerConfig;
pub(crate) use leader_worker::LeaderWorkerHandle;

/// Sent by the election timer. `epoch` identifies the timer reset it belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct ElectionTimeout {
    pub epoch: u64,
}

/// Sent by the leader's heartbeat ticker. `leadership` identifies the leadership stint it belongs
/// to, so ticks from a previous stint are ignored.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct LeaderHeartbeatTick {
    pub leadership: u64,
}
