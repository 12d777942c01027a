//! Per-chat sessions: bounded history and in-order processing.

use chrono::{DateTime, Utc};
use docsbot_knowledge::Turn;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// State of one chat.
///
/// The session lock is held for a whole pipeline run, so questions from the
/// same chat are answered one at a time in arrival order. Tokio's mutex
/// queues waiters fairly.
#[derive(Debug)]
pub struct ChatSession {
    chat_id: i64,
    created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
}

#[derive(Debug)]
struct SessionState {
    window: usize,
    history: VecDeque<Turn>,
}

/// Exclusive access to a session for one pipeline run.
pub struct SessionGuard<'a> {
    state: MutexGuard<'a, SessionState>,
}

impl ChatSession {
    fn new(chat_id: i64, window: usize) -> Self {
        Self {
            chat_id,
            created_at: Utc::now(),
            state: Mutex::new(SessionState {
                window,
                history: VecDeque::with_capacity(window),
            }),
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Wait for this chat's earlier messages to finish.
    pub async fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            state: self.state.lock().await,
        }
    }
}

impl SessionGuard<'_> {
    /// Earlier turns, oldest first.
    pub fn history(&self) -> Vec<Turn> {
        self.state.history.iter().cloned().collect()
    }

    /// Append a turn, evicting the oldest beyond the window.
    pub fn record(&mut self, turn: Turn) {
        if self.state.window == 0 {
            return;
        }
        while self.state.history.len() >= self.state.window {
            self.state.history.pop_front();
        }
        self.state.history.push_back(turn);
    }
}

/// All chat sessions of a running service, created on first message.
#[derive(Debug)]
pub struct SessionRegistry {
    window: usize,
    sessions: Mutex<HashMap<i64, Arc<ChatSession>>>,
}

impl SessionRegistry {
    /// `window` is the number of turns remembered per chat; 0 keeps none.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_create(&self, chat_id: i64) -> Arc<ChatSession> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(chat_id)
            .or_insert_with(|| {
                tracing::debug!(chat_id, "Opening chat session");
                Arc::new(ChatSession::new(chat_id, self.window))
            })
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Drop every session; returns how many there were.
    pub async fn clear(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let count = sessions.len();
        sessions.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_chat_same_session() {
        let registry = SessionRegistry::new(2);
        let a = registry.get_or_create(1).await;
        let b = registry.get_or_create(1).await;
        let c = registry.get_or_create(2).await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let registry = SessionRegistry::new(2);
        let session = registry.get_or_create(1).await;

        let mut guard = session.lock().await;
        guard.record(Turn::new("q1", "a1"));
        guard.record(Turn::new("q2", "a2"));
        guard.record(Turn::new("q3", "a3"));

        let history = guard.history();
        assert_eq!(history, vec![Turn::new("q2", "a2"), Turn::new("q3", "a3")]);
    }

    #[tokio::test]
    async fn test_zero_window_is_stateless() {
        let registry = SessionRegistry::new(0);
        let session = registry.get_or_create(1).await;

        let mut guard = session.lock().await;
        guard.record(Turn::new("q1", "a1"));
        assert!(guard.history().is_empty());
    }

    #[tokio::test]
    async fn test_lock_serializes_chat() {
        let registry = Arc::new(SessionRegistry::new(4));
        let session = registry.get_or_create(9).await;

        let guard = session.lock().await;
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move {
                let mut guard = session.lock().await;
                guard.record(Turn::new("second", "b"));
                guard.history().len()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);

        assert_eq!(waiter.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let registry = SessionRegistry::new(1);
        registry.get_or_create(1).await;
        registry.get_or_create(2).await;
        assert_eq!(registry.clear().await, 2);
        assert_eq!(registry.len().await, 0);
    }
}
