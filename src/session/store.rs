//! Session-keyed conversation histories

use crate::config::SessionConfig;
use crate::context::{CompressionResult, ContextWindowManager, Message, RetentionRules, Role};
use crate::error::{ContextError, Result};
use crate::llm::ChatModel;
use crate::metrics::METRICS;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex as SyncMutex};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One conversation's append-only history
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    messages: Vec<Message>,
    next_index: u64,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            next_index: 0,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, assigning the next sequence index and a timestamp
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> &Message {
        let index = self.next_index;
        self.next_index += 1;
        self.messages
            .push(Message::new(role, content, index).with_timestamp(Utc::now()));
        &self.messages[self.messages.len() - 1]
    }

    /// Drop messages appended after `len`; their indices stay consumed
    fn rollback(&mut self, len: usize) {
        self.messages.truncate(len);
    }
}

/// Owns every live session; operations on one session are serialized by its lock
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    manager: Arc<ContextWindowManager>,
    max_sessions: usize,
    /// Held across the limit check and the insert in `create`
    creation: SyncMutex<()>,
}

impl SessionStore {
    pub fn new(manager: Arc<ContextWindowManager>, config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sessions: DashMap::new(),
            manager,
            max_sessions: config.max_sessions,
            creation: SyncMutex::new(()),
        })
    }

    pub fn manager(&self) -> &ContextWindowManager {
        &self.manager
    }

    /// Start a session, optionally seeded with a system prompt; returns its id
    pub fn create(&self, system_prompt: Option<&str>) -> Result<String> {
        let _guard = self
            .creation
            .lock()
            .map_err(|_| ContextError::Internal("session creation lock poisoned".to_string()))?;
        if self.sessions.len() >= self.max_sessions {
            return Err(ContextError::SessionLimit {
                max: self.max_sessions,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let mut session = Session::new(id.clone());
        if let Some(prompt) = system_prompt {
            session.append(Role::System, prompt);
        }

        self.sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        METRICS.active_sessions.set(self.sessions.len() as i64);
        info!("Created session {}", id);
        Ok(id)
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        METRICS.active_sessions.set(self.sessions.len() as i64);
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn session(&self, id: &str) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ContextError::SessionNotFound(id.to_string()))
    }

    pub async fn append(&self, id: &str, role: Role, content: &str) -> Result<Message> {
        let session = self.session(id)?;
        let mut session = session.lock().await;
        Ok(session.append(role, content).clone())
    }

    /// Full uncompressed history
    pub async fn history(&self, id: &str) -> Result<Vec<Message>> {
        let session = self.session(id)?;
        let session = session.lock().await;
        Ok(session.messages().to_vec())
    }

    /// Message list for the next model call, compacted when over threshold
    pub async fn context(&self, id: &str) -> Result<Vec<Message>> {
        let session = self.session(id)?;
        let session = session.lock().await;
        Ok(self.manager.prepare(session.messages()))
    }

    /// Explicit compression pass with caller-supplied rules
    pub async fn compress(&self, id: &str, rules: &RetentionRules) -> Result<CompressionResult> {
        let session = self.session(id)?;
        let session = session.lock().await;
        Ok(self.manager.compress(session.messages(), rules))
    }

    /// Append the user turn, call the model on the prepared context and
    /// record its reply
    ///
    /// On model failure the user turn is rolled back so the history keeps
    /// question/answer pairs intact.
    pub async fn chat_turn(
        &self,
        id: &str,
        user_text: &str,
        model: &dyn ChatModel,
    ) -> Result<String> {
        let session = self.session(id)?;
        let mut session = session.lock().await;
        let before = session.len();

        session.append(Role::User, user_text);
        let context = self.manager.prepare(session.messages());
        debug!(
            "Session {}: sending {} of {} messages to {}",
            id,
            context.len(),
            session.len(),
            model.name()
        );

        match model.invoke(&context).await {
            Ok(reply) => {
                session.append(Role::Assistant, reply.clone());
                METRICS.record_chat_turn(true);
                Ok(reply)
            }
            Err(e) => {
                warn!("Session {}: model {} failed: {}", id, model.name(), e);
                session.rollback(before);
                METRICS.record_chat_turn(false);
                Err(e)
            }
        }
    }
}
