use crate::actor::Event;
use crate::election::timers::{ElectionTimeout, LeaderHeartbeatTick};
use std::time::Duration;
use tokio::sync::mpsc;

/// TestUtilActor stands in for the election actor and lets timer tests assert on what was queued.
pub(super) struct TestUtilActor {
    rx: mpsc::Receiver<Event>,
    quiet_period: Duration,
}

impl TestUtilActor {
    pub(super) fn new(rx: mpsc::Receiver<Event>) -> Self {
        TestUtilActor {
            rx,
            quiet_period: Duration::from_millis(10),
        }
    }

    async fn recv(&mut self) -> Event {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("Unexpected timeout")
            .expect("Expected value")
    }

    pub(super) async fn assert_election_timeout_event(&mut self, expected_epoch: u64) {
        match self.recv().await {
            Event::ElectionTimeout(ElectionTimeout { epoch }) => assert_eq!(epoch, expected_epoch),
            other => panic!("Unexpected event {:?}", other),
        }
    }

    pub(super) async fn assert_leader_heartbeat_event(&mut self, expected: LeaderHeartbeatTick) {
        match self.recv().await {
            Event::LeaderHeartbeatTick(tick) => assert_eq!(tick, expected),
            other => panic!("Unexpected event {:?}", other),
        }
    }

    pub(super) async fn assert_no_event(&mut self) {
        tokio::time::timeout(self.quiet_period, self.rx.recv())
            .await
            .expect_err("Expected timeout");
    }
}
