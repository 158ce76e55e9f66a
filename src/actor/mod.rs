use crate::api::ElectionNodeError;
use crate::election::{ElectionNode, ElectionStateSnapshot, ElectionTimeout, LeaderHeartbeatTick, Term};
use crate::message::Message;
use crate::shutdown::NodeShutdownSignal;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub(crate) enum Event {
    // Follower: validate and maybe restart election timer.
    // Candidate: count votes, step down on heartbeat.
    // Leader: step down on heartbeat of newer term.
    Inbound(Message),

    // Leader: discard
    // Candidate: start new election.
    // Follower: start new election.
    ElectionTimeout(ElectionTimeout),

    // Leader: broadcast heartbeat.
    // Candidate: discard
    // Follower: discard
    LeaderHeartbeatTick(LeaderHeartbeatTick),

    CurrentState(Callback<ElectionStateSnapshot>),
    SubscriberCount(Callback<usize>),
    IncreaseTerm(Callback<Result<Term, ElectionNodeError>>),
    StopHeartbeatTicker(Callback<()>),
    ResignLeader(Callback<()>),
    PublishCustom {
        message_type: String,
        data: serde_json::Value,
        callback: Callback<Result<(), ElectionNodeError>>,
    },
}

#[derive(Debug)]
pub(crate) struct Callback<O: Debug>(oneshot::Sender<O>);

impl<O: Debug> Callback<O> {
    fn send(self, output: O) {
        // Caller may have given up waiting.
        let _ = self.0.send(output);
    }
}

#[derive(Clone)]
pub(crate) struct ActorClient {
    sender: mpsc::Sender<Event>,
}

/// WeakActorClient doesn't keep the actor alive. Timer tasks hold one so they exit with the node.
#[derive(Clone)]
pub(crate) struct WeakActorClient {
    sender: mpsc::WeakSender<Event>,
}

impl ActorClient {
    pub(crate) fn new(queue_capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(queue_capacity);

        (ActorClient { sender: tx }, rx)
    }

    pub(crate) fn weak(&self) -> WeakActorClient {
        WeakActorClient {
            sender: self.sender.downgrade(),
        }
    }

    /// Waits for room in the queue.
    pub(crate) async fn inbound(&self, message: Message) -> Result<(), ElectionNodeError> {
        self.send(Event::Inbound(message)).await
    }

    pub(crate) async fn current_state(&self) -> Result<ElectionStateSnapshot, ElectionNodeError> {
        self.call(Event::CurrentState).await
    }

    pub(crate) async fn subscriber_count(&self) -> Result<usize, ElectionNodeError> {
        self.call(Event::SubscriberCount).await
    }

    pub(crate) async fn increase_term(&self) -> Result<Term, ElectionNodeError> {
        self.call(Event::IncreaseTerm).await?
    }

    pub(crate) async fn stop_heartbeat_ticker(&self) -> Result<(), ElectionNodeError> {
        self.call(Event::StopHeartbeatTicker).await
    }

    pub(crate) async fn resign_leader(&self) -> Result<(), ElectionNodeError> {
        self.call(Event::ResignLeader).await
    }

    pub(crate) async fn publish_custom(
        &self,
        message_type: String,
        data: serde_json::Value,
    ) -> Result<(), ElectionNodeError> {
        self.call(|callback| Event::PublishCustom {
            message_type,
            data,
            callback,
        })
        .await?
    }

    async fn call<O: Debug>(&self, to_event: impl FnOnce(Callback<O>) -> Event) -> Result<O, ElectionNodeError> {
        let (tx, rx) = oneshot::channel();
        self.send(to_event(Callback(tx))).await?;

        rx.await.map_err(|_| ElectionNodeError::NodeExited)
    }

    async fn send(&self, event: Event) -> Result<(), ElectionNodeError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| ElectionNodeError::NodeExited)
    }
}

impl WeakActorClient {
    pub(crate) fn upgrade(&self) -> Option<ActorClient> {
        self.sender.upgrade().map(|sender| ActorClient { sender })
    }

    pub(crate) async fn election_timeout(&self, timeout: ElectionTimeout) -> Result<(), ElectionNodeError> {
        self.strong()?.send(Event::ElectionTimeout(timeout)).await
    }

    pub(crate) async fn leader_heartbeat_tick(&self, tick: LeaderHeartbeatTick) -> Result<(), ElectionNodeError> {
        self.strong()?.send(Event::LeaderHeartbeatTick(tick)).await
    }

    fn strong(&self) -> Result<ActorClient, ElectionNodeError> {
        self.upgrade().ok_or(ElectionNodeError::NodeExited)
    }
}

/// ElectionActor is the election node in actor model. It is the only owner of the node's state.
pub(crate) struct ElectionActor {
    logger: slog::Logger,
    receiver: mpsc::Receiver<Event>,
    node: ElectionNode,
}

impl ElectionActor {
    pub(crate) fn new(logger: slog::Logger, receiver: mpsc::Receiver<Event>, node: ElectionNode) -> Self {
        ElectionActor { logger, receiver, node }
    }

    pub(crate) async fn run_event_loop(mut self, mut shutdown: NodeShutdownSignal) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                event = self.receiver.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            }
        }

        slog::info!(self.logger, "Election node event loop exited.");
        // Dropping the node stops its timers and leader worker.
    }

    // This must NOT be async. Any long running work must be spawned on another task and/or come
    // back as an event to this actor.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Inbound(message) => self.node.handle_message(message),
            Event::ElectionTimeout(timeout) => self.node.handle_election_timeout(timeout),
            Event::LeaderHeartbeatTick(tick) => self.node.handle_leader_heartbeat_tick(tick),
            Event::CurrentState(callback) => callback.send(self.node.current_state()),
            Event::SubscriberCount(callback) => callback.send(self.node.subscriber_count()),
            Event::IncreaseTerm(callback) => callback.send(self.node.increase_term()),
            Event::StopHeartbeatTicker(callback) => {
                self.node.stop_heartbeat_ticker();
                callback.send(());
            }
            Event::ResignLeader(callback) => {
                self.node.resign_leader();
                callback.send(());
            }
            Event::PublishCustom {
                message_type,
                data,
                callback,
            } => callback.send(self.node.publish_custom(message_type, data)),
        }
    }
}
