//! The dispatcher handle and its background flush task.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};
use tokio::task::{AbortHandle, JoinError, JoinSet};
use tracing::{debug, info, trace, warn};
use turnbase_protocol::{PlayerId, RoomId, ServerEvent, Target};

use crate::{Batch, DispatchError, DispatcherConfig, FlushMetrics, FlushTicker, Transport, TransportError};

/// A payload addressed to one target.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub target: Target,
    pub payload: serde_json::Value,
}

/// Delivery counters, reported by [`EventDispatcher::stats`] and on shutdown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchStats {
    /// Flushes that had at least one batch to send.
    pub flushes: u64,
    pub batches_delivered: u64,
    pub batches_dropped: u64,
    pub messages_delivered: u64,
    pub messages_dropped: u64,
    pub ticker: FlushMetrics,
}

enum DispatchCommand {
    Enqueue(Outbound),
    Stats(oneshot::Sender<DispatchStats>),
    Shutdown(oneshot::Sender<DispatchStats>),
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to the dispatcher. Cheap to clone; every room holds one.
///
/// Enqueueing never blocks and never waits for the flush task.
#[derive(Clone)]
pub struct EventDispatcher {
    sender: mpsc::UnboundedSender<DispatchCommand>,
    closing: Arc<AtomicBool>,
}

impl EventDispatcher {
    /// Spawns the flush task on the current Tokio runtime.
    pub fn spawn<T: Transport>(transport: T, config: DispatcherConfig) -> Self {
        let config = config.validated();
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = DispatchTask {
            transport: Arc::new(transport),
            ticker: FlushTicker::new(config.flush_interval),
            config,
            receiver,
            queues: HashMap::new(),
            in_flight: HashMap::new(),
            sends: JoinSet::new(),
            stats: DispatchStats::default(),
            shutdown_reply: None,
        };
        tokio::spawn(task.run());

        Self {
            sender,
            closing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A dispatcher with no flush task. Everything enqueued shows up, in
    /// order, on the returned receiver, for callers that drive delivery
    /// themselves.
    pub fn unscheduled() -> (Self, OutboundReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            sender,
            closing: Arc::new(AtomicBool::new(false)),
        };
        (handle, OutboundReceiver { receiver })
    }

    /// Queues `payload` for everyone in `room_id`.
    pub fn enqueue_broadcast(
        &self,
        room_id: &RoomId,
        payload: serde_json::Value,
    ) -> Result<(), DispatchError> {
        self.enqueue(Target::Room(room_id.clone()), payload)
    }

    /// Queues `payload` for one player.
    pub fn enqueue_to_user(
        &self,
        user_id: &PlayerId,
        payload: serde_json::Value,
    ) -> Result<(), DispatchError> {
        self.enqueue(Target::User(user_id.clone()), payload)
    }

    /// Queues `payload` for `target`.
    pub fn enqueue(&self, target: Target, payload: serde_json::Value) -> Result<(), DispatchError> {
        if self.closing.load(Ordering::Acquire) {
            return Err(DispatchError::ShuttingDown);
        }
        self.sender
            .send(DispatchCommand::Enqueue(Outbound { target, payload }))
            .map_err(|_| DispatchError::ShuttingDown)
    }

    /// Encodes `event` and queues it for everyone in `room_id`.
    pub fn broadcast_event(&self, room_id: &RoomId, event: &ServerEvent) -> Result<(), DispatchError> {
        self.enqueue_broadcast(room_id, event.to_payload()?)
    }

    /// Encodes `event` and queues it for one player.
    pub fn send_event(&self, user_id: &PlayerId, event: &ServerEvent) -> Result<(), DispatchError> {
        self.enqueue_to_user(user_id, event.to_payload()?)
    }

    /// `true` once `shutdown` has been called on any clone.
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Current delivery counters.
    pub async fn stats(&self) -> Result<DispatchStats, DispatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DispatchCommand::Stats(reply_tx))
            .map_err(|_| DispatchError::Stopped)?;
        reply_rx.await.map_err(|_| DispatchError::Stopped)
    }

    /// Stops accepting messages, lets an in-flight flush finish, delivers
    /// whatever is still queued and stops the flush task.
    ///
    /// Returns the final counters. A second call finds the task gone and
    /// returns [`DispatchError::Stopped`].
    pub async fn shutdown(&self) -> Result<DispatchStats, DispatchError> {
        self.closing.store(true, Ordering::Release);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DispatchCommand::Shutdown(reply_tx))
            .map_err(|_| DispatchError::Stopped)?;
        reply_rx.await.map_err(|_| DispatchError::Stopped)
    }
}

/// Receiving end of an [`EventDispatcher::unscheduled`] dispatcher.
pub struct OutboundReceiver {
    receiver: mpsc::UnboundedReceiver<DispatchCommand>,
}

impl OutboundReceiver {
    /// Waits for the next outbound message. Returns `None` once every
    /// handle has been dropped.
    pub async fn recv(&mut self) -> Option<Outbound> {
        loop {
            match self.receiver.recv().await? {
                DispatchCommand::Enqueue(outbound) => return Some(outbound),
                DispatchCommand::Stats(reply) | DispatchCommand::Shutdown(reply) => {
                    let _ = reply.send(DispatchStats::default());
                }
            }
        }
    }

    /// Everything enqueued so far, in order, without waiting.
    pub fn drain(&mut self) -> Vec<Outbound> {
        let mut drained = Vec::new();
        while let Ok(command) = self.receiver.try_recv() {
            match command {
                DispatchCommand::Enqueue(outbound) => drained.push(outbound),
                DispatchCommand::Stats(reply) | DispatchCommand::Shutdown(reply) => {
                    let _ = reply.send(DispatchStats::default());
                }
            }
        }
        drained
    }
}

// ---------------------------------------------------------------------------
// Flush task
// ---------------------------------------------------------------------------

/// Result of one detached send: target, payload count, outcome.
type SendResult = (Target, usize, Result<(), TransportError>);

struct DispatchTask<T: Transport> {
    transport: Arc<T>,
    config: DispatcherConfig,
    ticker: FlushTicker,
    receiver: mpsc::UnboundedReceiver<DispatchCommand>,
    /// One queue per target, created on first use and removed by each
    /// flush, so only non-empty queues exist between ticks.
    queues: HashMap<Target, Batch>,
    /// Targets with a send still running. Each target has at most one send
    /// in flight, which keeps its batches in order.
    in_flight: HashMap<Target, AbortHandle>,
    sends: JoinSet<SendResult>,
    stats: DispatchStats,
    shutdown_reply: Option<oneshot::Sender<DispatchStats>>,
}

impl<T: Transport> DispatchTask<T> {
    async fn run(mut self) {
        info!(
            flush_ms = self.config.flush_interval.as_millis() as u64,
            "event dispatcher started"
        );

        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("all dispatcher handles dropped");
                        self.finish().await;
                        break;
                    }
                },
                _ = self.ticker.wait_for_tick() => {
                    self.drain_pending();
                    self.flush();
                    self.ticker.record_flush_end();
                }
                Some(joined) = self.sends.join_next(), if !self.sends.is_empty() => {
                    self.record(joined);
                }
            }

            if let Some(reply) = self.shutdown_reply.take() {
                self.ticker.stop();
                self.finish().await;
                let _ = reply.send(self.snapshot());
                break;
            }
        }

        info!(
            delivered = self.stats.batches_delivered,
            dropped = self.stats.batches_dropped,
            "event dispatcher stopped"
        );
    }

    fn handle(&mut self, command: DispatchCommand) {
        match command {
            DispatchCommand::Enqueue(outbound) => {
                self.queues
                    .entry(outbound.target)
                    .or_default()
                    .push(outbound.payload);
            }
            DispatchCommand::Stats(reply) => {
                let _ = reply.send(self.snapshot());
            }
            DispatchCommand::Shutdown(reply) => {
                self.shutdown_reply = Some(reply);
            }
        }
    }

    /// Pulls in everything already sitting in the channel so that it makes
    /// this flush instead of the next one.
    fn drain_pending(&mut self) {
        while let Ok(command) = self.receiver.try_recv() {
            self.handle(command);
        }
    }

    /// Starts one detached send per queued target and returns without
    /// waiting for any of them.
    ///
    /// A target whose previous batch is still in flight keeps its queue
    /// until a later tick.
    fn flush(&mut self) {
        let queues = std::mem::take(&mut self.queues);
        let mut started = 0;

        for (target, batch) in queues {
            if batch.is_empty() {
                continue;
            }
            if self.in_flight.contains_key(&target) {
                trace!(%target, size = batch.len(), "previous batch still in flight, holding");
                self.queues.insert(target, batch);
                continue;
            }

            let transport = Arc::clone(&self.transport);
            let timeout = self.config.send_timeout;
            let key = target.clone();
            let handle = self.sends.spawn(async move {
                let size = batch.len();
                let result = match tokio::time::timeout(timeout, deliver(&*transport, &target, batch)).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout(timeout)),
                };
                (target, size, result)
            });
            self.in_flight.insert(key, handle);
            started += 1;
        }

        if started > 0 {
            self.stats.flushes += 1;
        }
    }

    fn record(&mut self, joined: Result<SendResult, JoinError>) {
        match joined {
            Ok((target, size, Ok(()))) => {
                trace!(%target, size, "batch delivered");
                self.in_flight.remove(&target);
                self.stats.batches_delivered += 1;
                self.stats.messages_delivered += size as u64;
            }
            Ok((target, size, Err(error))) => {
                warn!(%target, size, %error, "batch dropped");
                self.in_flight.remove(&target);
                self.stats.batches_dropped += 1;
                self.stats.messages_dropped += size as u64;
            }
            Err(error) => {
                // A panicked send doesn't report its target. Release every
                // target whose send is no longer running.
                warn!(%error, "batch send task failed");
                self.stats.batches_dropped += 1;
                self.in_flight.retain(|_, handle| !handle.is_finished());
            }
        }
    }

    /// Waits for every running send and delivers everything still queued,
    /// including batches held back behind a slow send.
    async fn finish(&mut self) {
        loop {
            self.drain_pending();
            self.flush();
            match self.sends.join_next().await {
                Some(joined) => self.record(joined),
                None => break,
            }
        }
    }

    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            ticker: self.ticker.metrics().clone(),
            ..self.stats.clone()
        }
    }
}

async fn deliver<T: Transport>(transport: &T, target: &Target, batch: Batch) -> Result<(), TransportError> {
    match target {
        Target::Room(room_id) => transport.send_to_group(room_id, batch).await,
        Target::User(user_id) => transport.send_to_user(user_id, batch).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unscheduled_preserves_order() {
        let (dispatcher, mut outbound) = EventDispatcher::unscheduled();
        let room = RoomId::from("r1");
        dispatcher.enqueue_broadcast(&room, json!(1)).unwrap();
        dispatcher
            .enqueue_to_user(&PlayerId::from("alice"), json!(2))
            .unwrap();
        dispatcher.enqueue_broadcast(&room, json!(3)).unwrap();

        let drained = outbound.drain();
        let payloads: Vec<_> = drained.iter().map(|o| o.payload.clone()).collect();
        assert_eq!(payloads, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(drained[1].target, Target::User(PlayerId::from("alice")));
    }

    #[tokio::test]
    async fn test_broadcast_event_encodes_payload() {
        let (dispatcher, mut outbound) = EventDispatcher::unscheduled();
        dispatcher
            .broadcast_event(&RoomId::from("r1"), &ServerEvent::error("nope"))
            .unwrap();
        let message = outbound.recv().await.unwrap();
        assert_eq!(message.payload["EventType"], "Error");
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_is_rejected() {
        let (dispatcher, mut outbound) = EventDispatcher::unscheduled();
        let (stats, _) = tokio::join!(dispatcher.shutdown(), async {
            tokio::task::yield_now().await;
            outbound.drain()
        });
        assert_eq!(stats.unwrap(), DispatchStats::default());
        assert!(dispatcher.is_closing());

        let err = dispatcher
            .enqueue_broadcast(&RoomId::from("r1"), json!(null))
            .unwrap_err();
        assert!(matches!(err, DispatchError::ShuttingDown));
    }
}
