use crate::election::TimingPolicy;
use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct ElectionOptions {
    /// How often the leader broadcasts a heartbeat. Default 100ms.
    pub heartbeat_interval: Option<Duration>,
    /// Election timeouts are drawn from
    /// `[min_multiplier * heartbeat_interval, max_multiplier * heartbeat_interval]`. Defaults 3 and 6.
    pub election_timeout_min_multiplier: Option<u32>,
    pub election_timeout_max_multiplier: Option<u32>,
    /// How often the leader runs its LeaderJob. Default 10s.
    pub submit_interval: Option<Duration>,
    /// How often the NodeJob runs, if one is configured. Default 10s.
    pub job_interval: Option<Duration>,
    /// Capacity of the queue between the topic and the election event loop. Default 15.
    pub inbound_queue_capacity: Option<usize>,
    /// Capacity of the queue between the election event loop and the topic publisher. Default 64.
    pub outbox_capacity: Option<usize>,
    /// Let a node with nobody else on the topic lead by itself. Default false.
    pub lone_node_leadership: Option<bool>,
}

pub(super) struct ElectionOptionsValidated {
    pub heartbeat_interval: Duration,
    pub election_timeout_min_multiplier: u32,
    pub election_timeout_max_multiplier: u32,
    pub submit_interval: Duration,
    pub job_interval: Duration,
    pub inbound_queue_capacity: usize,
    pub outbox_capacity: usize,
    pub lone_node_leadership: bool,
}

impl ElectionOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.heartbeat_interval == Duration::from_millis(0) {
            return Err("Heartbeat interval must be non-zero");
        }
        if self.election_timeout_min_multiplier < 2 {
            return Err("Election timeout must be at least two heartbeat intervals");
        }
        if self.election_timeout_min_multiplier >= self.election_timeout_max_multiplier {
            return Err("Election timeout minimum multiplier must be less than maximum multiplier");
        }
        if self.submit_interval <= self.heartbeat_interval {
            return Err("Submit interval must be greater than the heartbeat interval");
        }
        if self.job_interval == Duration::from_millis(0) {
            return Err("Job interval must be non-zero");
        }
        if self.inbound_queue_capacity == 0 {
            return Err("Inbound queue capacity must be greater than zero");
        }
        if self.outbox_capacity == 0 {
            return Err("Outbox capacity must be greater than zero");
        }

        Ok(())
    }

    pub(super) fn timing(&self) -> TimingPolicy {
        TimingPolicy {
            heartbeat_interval: self.heartbeat_interval,
            election_timeout_min_multiplier: self.election_timeout_min_multiplier,
            election_timeout_max_multiplier: self.election_timeout_max_multiplier,
            submit_interval: self.submit_interval,
        }
    }
}

impl TryFrom<ElectionOptions> for ElectionOptionsValidated {
    type Error = &'static str;

    fn try_from(options: ElectionOptions) -> Result<Self, Self::Error> {
        let values = ElectionOptionsValidated {
            heartbeat_interval: options.heartbeat_interval.unwrap_or(Duration::from_millis(100)),
            election_timeout_min_multiplier: options.election_timeout_min_multiplier.unwrap_or(3),
            election_timeout_max_multiplier: options.election_timeout_max_multiplier.unwrap_or(6),
            submit_interval: options.submit_interval.unwrap_or(Duration::from_secs(10)),
            job_interval: options.job_interval.unwrap_or(Duration::from_secs(10)),
            inbound_queue_capacity: options.inbound_queue_capacity.unwrap_or(15),
            outbox_capacity: options.outbox_capacity.unwrap_or(64),
            lone_node_leadership: options.lone_node_leadership.unwrap_or(false),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = ElectionOptionsValidated::try_from(ElectionOptions::default()).unwrap();

        let timing = options.timing();
        assert_eq!(timing.heartbeat_interval, Duration::from_millis(100));
        assert_eq!(
            timing.election_timeout_range(),
            Duration::from_millis(300)..=Duration::from_millis(600)
        );
        assert_eq!(timing.submit_interval, Duration::from_secs(10));
        assert_eq!(options.job_interval, Duration::from_secs(10));
        assert_eq!(options.inbound_queue_capacity, 15);
        assert_eq!(options.outbox_capacity, 64);
        assert!(!options.lone_node_leadership);
    }

    #[test]
    fn illegal_options_are_rejected() {
        fn assert_rejected(options: ElectionOptions) {
            assert!(ElectionOptionsValidated::try_from(options).is_err());
        }

        assert_rejected(ElectionOptions {
            heartbeat_interval: Some(Duration::from_millis(0)),
            ..Default::default()
        });
        assert_rejected(ElectionOptions {
            election_timeout_min_multiplier: Some(1),
            ..Default::default()
        });
        assert_rejected(ElectionOptions {
            election_timeout_min_multiplier: Some(6),
            election_timeout_max_multiplier: Some(6),
            ..Default::default()
        });
        assert_rejected(ElectionOptions {
            heartbeat_interval: Some(Duration::from_secs(1)),
            submit_interval: Some(Duration::from_secs(1)),
            ..Default::default()
        });
        assert_rejected(ElectionOptions {
            job_interval: Some(Duration::from_millis(0)),
            ..Default::default()
        });
        assert_rejected(ElectionOptions {
            inbound_queue_capacity: Some(0),
            ..Default::default()
        });
        assert_rejected(ElectionOptions {
            outbox_capacity: Some(0),
            ..Default::default()
        });
    }
}
