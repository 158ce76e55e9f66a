use crate::actor::WeakActorClient;
use crate::api::{ElectionNodeError, LeaderJob};
use crate::election::custom_dispatch::CustomMessageDispatcher;
use crate::election::outbox::{Outbox, OutboxError};
use crate::election::state_change_listener::{self, ElectionStateChangeNotifier};
use crate::election::timers::{
    ElectionTimeout, ElectionTimerHandle, LeaderHeartbeatTick, LeaderWorkerConfig, LeaderWorkerHandle,
};
use crate::election::{
    ElectionState, ElectionStateChangeListener, ElectionStateSnapshot, NodeId, Role, Term, TimingPolicy,
};
use crate::gossip::GossipTopic;
use crate::message::{
    CustomMessage, HeartbeatPayload, Message, MessageBody, MessageType, ReplyVotePayload, RequestVotePayload,
};
use std::collections::HashSet;
use std::sync::Arc;

pub(crate) struct NodeConfig {
    pub logger: slog::Logger,
    pub my_id: NodeId,
    pub topic: Arc<dyn GossipTopic>,
    pub timing: TimingPolicy,
    pub lone_node_leadership: bool,
    pub leader_job: Arc<dyn LeaderJob>,
    pub outbox: Outbox,
    pub custom_dispatcher: CustomMessageDispatcher,
    pub actor_client: WeakActorClient,
}

/// ElectionNode decides "when" the election state changes for one topic. Every method is called
/// from the actor's event loop and must never block or await; slow work lives in the timer,
/// outbox and leader worker tasks.
pub(crate) struct ElectionNode {
    logger: slog::Logger,
    my_id: NodeId,
    topic: Arc<dyn GossipTopic>,
    timing: TimingPolicy,
    lone_node_leadership: bool,
    leader_job: Arc<dyn LeaderJob>,
    outbox: Outbox,
    custom_dispatcher: CustomMessageDispatcher,
    actor_client: WeakActorClient,

    state: ElectionState,
    // Peers whose grant was counted in the current candidacy. Gossip may deliver a reply twice.
    voters: HashSet<NodeId>,

    election_timer: Option<ElectionTimerHandle>,
    timer_epoch: u64,
    leader_worker: Option<LeaderWorkerHandle>,
    leadership: u64,

    state_change_notifier: ElectionStateChangeNotifier,
}

impl ElectionNode {
    pub(crate) fn new(config: NodeConfig) -> (Self, ElectionStateChangeListener) {
        let state = ElectionState::new_follower();
        let (notifier, listener) = state_change_listener::new(ElectionStateSnapshot {
            role: state.role(),
            term: state.term(),
            leader: None,
        });

        let mut node = ElectionNode {
            logger: config.logger,
            my_id: config.my_id,
            topic: config.topic,
            timing: config.timing,
            lone_node_leadership: config.lone_node_leadership,
            leader_job: config.leader_job,
            outbox: config.outbox,
            custom_dispatcher: config.custom_dispatcher,
            actor_client: config.actor_client,
            state,
            voters: HashSet::new(),
            election_timer: None,
            timer_epoch: 0,
            leader_worker: None,
            leadership: 0,
            state_change_notifier: notifier,
        };
        node.restart_election_timer();
        slog::info!(node.logger, "Joined topic as follower at term {:?}", node.state.term());

        (node, listener)
    }

    // ------- Queries --------

    pub(crate) fn current_state(&self) -> ElectionStateSnapshot {
        let leader = match self.state.role() {
            Role::Leader => Some(self.my_id.clone()),
            _ => self.state.leader().cloned(),
        };

        ElectionStateSnapshot {
            role: self.state.role(),
            term: self.state.term(),
            leader,
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.topic.subscriber_count()
    }

    // ------- Inbound messages --------

    pub(crate) fn handle_message(&mut self, message: Message) {
        let Message { sent_from, body } = message;
        if sent_from == self.my_id {
            return;
        }

        match body {
            MessageBody::Heartbeat(payload) => self.handle_heartbeat(sent_from, payload),
            MessageBody::RequestVote(payload) => self.handle_request_vote(sent_from, payload),
            MessageBody::ReplyVote(payload) => self.handle_reply_vote(sent_from, payload),
            MessageBody::Custom { message_type, data } => {
                let message = CustomMessage {
                    message_type,
                    sent_from,
                    data,
                };
                if !self.custom_dispatcher.dispatch(message) {
                    slog::warn!(self.logger, "Custom message worker is gone, dropping message.");
                }
            }
        }
    }

    fn handle_heartbeat(&mut self, sent_from: NodeId, payload: HeartbeatPayload) {
        if payload.leader_id != sent_from {
            slog::warn!(
                self.logger,
                "Dropping heartbeat from {:?} claiming leader {:?}",
                sent_from,
                payload.leader_id
            );
            return;
        }

        let term_before = self.state.term();
        if payload.term < term_before {
            slog::debug!(
                self.logger,
                "Dropping stale heartbeat from {:?} for term {:?}. Current term is {:?}.",
                sent_from,
                payload.term,
                term_before
            );
            return;
        }

        match self.state.role() {
            Role::Leader if payload.term > term_before => {
                slog::info!(
                    self.logger,
                    "Heard leader {:?} of newer term {:?}. Stepping down.",
                    sent_from,
                    payload.term
                );
                self.resign();
                self.state.set_role(Role::Follower);
            }
            Role::Leader => {
                slog::warn!(
                    self.logger,
                    "Ignoring heartbeat from {:?} for term {:?} while leading term {:?}",
                    sent_from,
                    payload.term,
                    term_before
                );
                return;
            }
            Role::Candidate => {
                slog::info!(
                    self.logger,
                    "Heard leader {:?} for term {:?}. Abandoning candidacy.",
                    sent_from,
                    payload.term
                );
                self.resign();
                self.state.set_role(Role::Follower);
            }
            Role::Follower => {}
        }

        self.restart_election_timer();
        let term_increased = self.adopt_term(payload.term);
        if term_increased || self.state.leader().is_none() {
            slog::info!(self.logger, "Following leader {:?} at term {:?}", sent_from, payload.term);
            self.state.set_leader(Some(sent_from));
        }
        self.notify_state_change();
    }

    fn handle_request_vote(&mut self, candidate: NodeId, payload: RequestVotePayload) {
        if self.state.role() == Role::Leader {
            slog::debug!(
                self.logger,
                "Leader ignoring vote request from {:?} for term {:?}",
                candidate,
                payload.term
            );
            return;
        }

        if payload.term < self.state.term() {
            slog::info!(
                self.logger,
                "Not granting vote to {:?}. Its term {:?} is out of date.",
                candidate,
                payload.term
            );
            self.reply_vote(candidate, false);
            return;
        }

        self.adopt_term(payload.term);

        let grant = match self.state.voted_for() {
            None => true,
            Some(voted_for) => voted_for == &candidate,
        };

        if grant {
            slog::info!(self.logger, "Voting for {:?} in term {:?}", candidate, self.state.term());
            self.state.set_voted_for(Some(candidate.clone()));
        } else {
            slog::info!(
                self.logger,
                "Not granting vote to {:?}. We already voted for {:?}.",
                candidate,
                self.state.voted_for()
            );
        }

        // Backing off after a grant gives the candidate time to win before we compete with it.
        if grant || self.state.role() == Role::Candidate {
            self.restart_election_timer();
        }

        self.reply_vote(candidate, grant);
        self.notify_state_change();
    }

    fn reply_vote(&mut self, candidate: NodeId, vote_granted: bool) {
        let reply = MessageBody::ReplyVote(ReplyVotePayload {
            vote_granted,
            leader_id: candidate,
            term: Some(self.state.term()),
        });
        let _ = self.send(reply);
    }

    fn handle_reply_vote(&mut self, voter: NodeId, payload: ReplyVotePayload) {
        if self.state.role() != Role::Candidate {
            return;
        }
        if let Some(term) = payload.term {
            if term != self.state.term() {
                slog::debug!(
                    self.logger,
                    "Ignoring vote reply from {:?} for term {:?}. Current term is {:?}.",
                    voter,
                    term,
                    self.state.term()
                );
                return;
            }
        }
        if !payload.vote_granted || payload.leader_id != self.my_id {
            return;
        }
        if !self.voters.insert(voter.clone()) {
            slog::debug!(self.logger, "Duplicate vote from {:?}", voter);
            return;
        }

        let votes = self.state.votes() + 1;
        self.state.set_votes(votes);

        let subscriber_count = self.topic.subscriber_count();
        slog::info!(
            self.logger,
            "Received vote from {:?}. Have {} votes with {} peers subscribed.",
            voter,
            votes,
            subscriber_count
        );

        if TimingPolicy::has_quorum(votes, subscriber_count) {
            self.become_leader(subscriber_count);
        }
    }

    // ------- Timers --------

    pub(crate) fn handle_election_timeout(&mut self, timeout: ElectionTimeout) {
        if timeout.epoch != self.timer_epoch {
            slog::debug!(self.logger, "Ignoring stale election timeout {}", timeout.epoch);
            return;
        }
        if self.state.role() == Role::Leader {
            return;
        }

        self.start_election();
    }

    pub(crate) fn handle_leader_heartbeat_tick(&mut self, tick: LeaderHeartbeatTick) {
        if self.state.role() != Role::Leader || tick.leadership != self.leadership {
            slog::debug!(self.logger, "Received heartbeat tick but no longer leader.");
            return;
        }

        let heartbeat = MessageBody::Heartbeat(HeartbeatPayload {
            leader_id: self.my_id.clone(),
            term: self.state.term(),
        });
        let _ = self.send(heartbeat);
    }

    // ------- Transitions --------

    fn start_election(&mut self) {
        let term = match self.state.term().next() {
            Some(term) => term,
            None => {
                slog::error!(
                    self.logger,
                    "Term {:?} can't be increased. Not starting an election.",
                    self.state.term()
                );
                return;
            }
        };
        self.adopt_term(term);

        // Voting for ourselves keeps us from backing another candidate of this term. The vote is
        // never counted toward quorum.
        self.state.set_voted_for(Some(self.my_id.clone()));
        self.state.set_role(Role::Candidate);
        self.voters.clear();
        self.restart_election_timer();

        let subscriber_count = self.topic.subscriber_count();
        slog::info!(
            self.logger,
            "Election timeout. Starting election for term {:?} with {} peers subscribed.",
            term,
            subscriber_count
        );
        self.notify_state_change();

        if subscriber_count == 0 && self.lone_node_leadership {
            self.become_leader(subscriber_count);
            return;
        }

        let _ = self.send(MessageBody::RequestVote(RequestVotePayload { term }));
    }

    fn become_leader(&mut self, subscriber_count: usize) {
        self.resign();
        self.stop_election_timer();
        self.state.set_role(Role::Leader);
        self.leadership += 1;

        slog::info!(
            self.logger,
            "Won election for term {:?} with {} votes and {} peers subscribed.",
            self.state.term(),
            self.state.votes(),
            subscriber_count
        );

        self.leader_worker = Some(LeaderWorkerHandle::spawn(LeaderWorkerConfig {
            logger: self
                .logger
                .new(slog::o!("Leadership" => self.leadership, "Term" => self.state.term().as_u64())),
            node_id: self.my_id.clone(),
            leadership: self.leadership,
            heartbeat_interval: self.timing.heartbeat_interval,
            submit_interval: self.timing.submit_interval,
            actor_client: self.actor_client.clone(),
            leader_job: self.leader_job.clone(),
        }));
        self.notify_state_change();
    }

    /// Stops the heartbeat and submit tickers. Role is left untouched. Safe to call any number of
    /// times.
    fn resign(&mut self) {
        if let Some(worker) = self.leader_worker.take() {
            worker.resign();
            slog::info!(self.logger, "Stopped leader tickers.");
        }
    }

    /// Returns true if the term strictly increased. A new term has no known leader yet.
    fn adopt_term(&mut self, term: Term) -> bool {
        match self.state.set_term(term) {
            Ok(true) => {
                self.state.set_leader(None);
                if self.state.role() == Role::Candidate {
                    // Grants counted so far belong to the old term.
                    self.state.set_votes(0);
                    self.voters.clear();
                }
                true
            }
            Ok(false) => false,
            Err(e) => {
                slog::warn!(self.logger, "{}", e);
                false
            }
        }
    }

    fn restart_election_timer(&mut self) {
        self.timer_epoch += 1;
        match &self.election_timer {
            Some(timer) => timer.reset_timeout(self.timer_epoch),
            None => {
                self.election_timer = Some(ElectionTimerHandle::spawn_timer_task(
                    self.timing,
                    self.timer_epoch,
                    self.actor_client.clone(),
                ))
            }
        }
    }

    fn stop_election_timer(&mut self) {
        // Bumping the epoch invalidates a timeout that is already queued.
        self.timer_epoch += 1;
        self.election_timer = None;
    }

    // ------- Commands from the embedding application --------

    pub(crate) fn increase_term(&mut self) -> Result<Term, ElectionNodeError> {
        let term = self.state.term().next().ok_or(ElectionNodeError::TermExhausted)?;
        self.adopt_term(term);
        slog::info!(self.logger, "Term increased to {:?} on request.", term);
        self.notify_state_change();
        Ok(term)
    }

    /// Stops the leader tickers and steps down to follower, so peers can elect a replacement.
    pub(crate) fn stop_heartbeat_ticker(&mut self) {
        self.resign();
        self.resign_leader();
    }

    /// Steps down from leadership and goes back to waiting for heartbeats.
    pub(crate) fn resign_leader(&mut self) {
        if self.state.role() != Role::Leader {
            slog::debug!(self.logger, "Asked to resign but not leader.");
            return;
        }

        slog::info!(self.logger, "Resigning leadership of term {:?}", self.state.term());
        self.resign();
        self.state.set_role(Role::Follower);
        self.restart_election_timer();
        self.notify_state_change();
    }

    pub(crate) fn publish_custom(
        &mut self,
        message_type: String,
        data: serde_json::Value,
    ) -> Result<(), ElectionNodeError> {
        if !MessageType::from(message_type.as_str()).is_custom() {
            return Err(ElectionNodeError::ReservedMessageType(message_type));
        }

        match self.send(MessageBody::Custom { message_type, data }) {
            Ok(()) => Ok(()),
            Err(OutboxError::Full) => Err(ElectionNodeError::OutboxFull),
            Err(OutboxError::Closed) => Err(ElectionNodeError::NodeExited),
        }
    }

    fn send(&mut self, body: MessageBody) -> Result<(), OutboxError> {
        let message_type = body.message_type();
        let sent = self.outbox.send(body);
        match &sent {
            Ok(()) => {}
            Err(OutboxError::Full) => {
                slog::warn!(self.logger, "Outbox full, dropping outgoing '{}' message.", message_type)
            }
            Err(OutboxError::Closed) => {
                slog::error!(self.logger, "Publisher is gone, dropping outgoing '{}' message.", message_type)
            }
        }
        sent
    }

    fn notify_state_change(&self) {
        self.state_change_notifier.notify_new_state(self.current_state());
    }
}
