//! Per-chat message queues in front of [`AnswerService`].
//!
//! Each chat gets one queue and one worker task that handles its messages
//! strictly one after another. A message's place in line is fixed when it is
//! dispatched, before any await, so replies within a chat follow arrival
//! order on any runtime. Different chats run concurrently.

use crate::message::ChatMessage;
use crate::pipeline::{AnswerService, PipelineOutcome};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Outcome of one dispatched message, tagged with its chat.
#[derive(Debug)]
pub struct Dispatched {
    pub chat_id: i64,
    pub outcome: PipelineOutcome,
}

/// Routes messages to per-chat workers.
pub struct Dispatcher {
    service: AnswerService,
    queues: HashMap<i64, mpsc::UnboundedSender<ChatMessage>>,
    workers: JoinSet<()>,
    outcomes: mpsc::UnboundedSender<Dispatched>,
}

impl Dispatcher {
    /// Outcomes, ignored ones included, are sent to `outcomes` in per-chat
    /// arrival order.
    pub fn new(service: AnswerService, outcomes: mpsc::UnboundedSender<Dispatched>) -> Self {
        Self {
            service,
            queues: HashMap::new(),
            workers: JoinSet::new(),
            outcomes,
        }
    }

    /// Queue `message` behind earlier messages of the same chat.
    pub fn dispatch(&mut self, message: ChatMessage) {
        let chat_id = message.chat_id;

        let message = match self.queues.get(&chat_id) {
            Some(queue) => match queue.send(message) {
                Ok(()) => return,
                // worker is gone (it panicked); start a fresh one
                Err(mpsc::error::SendError(message)) => {
                    tracing::warn!(chat_id, "Chat worker stopped, restarting");
                    message
                }
            },
            None => message,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        // fresh receiver, cannot be closed yet
        let _ = tx.send(message);
        self.queues.insert(chat_id, tx);
        self.spawn_worker(chat_id, rx);
    }

    fn spawn_worker(&mut self, chat_id: i64, mut rx: mpsc::UnboundedReceiver<ChatMessage>) {
        let service = self.service.clone();
        let outcomes = self.outcomes.clone();
        let span = tracing::debug_span!("chat_worker", chat_id);

        self.workers.spawn(
            async move {
                while let Some(message) = rx.recv().await {
                    let outcome = service.handle(message).await;
                    if outcomes.send(Dispatched { chat_id, outcome }).is_err() {
                        tracing::debug!("Outcome receiver dropped, stopping");
                        break;
                    }
                }
            }
            .instrument(span),
        );
    }

    /// Collect workers that already finished and report panics.
    ///
    /// Returns how many were reaped.
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        while let Some(joined) = self.workers.try_join_next() {
            reaped += 1;
            if let Err(e) = joined {
                tracing::error!("Chat worker failed: {}", e);
            }
        }
        reaped
    }

    /// Number of chats with a queue.
    pub fn chat_count(&self) -> usize {
        self.queues.len()
    }

    /// Number of worker tasks not yet reaped.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close every queue and wait until all queued messages are handled.
    pub async fn finish(mut self) {
        self.queues.clear();
        tracing::info!("Draining {} chat workers", self.workers.len());
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Chat worker failed: {}", e);
            }
        }
    }
}
