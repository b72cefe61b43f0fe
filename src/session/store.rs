//! In-memory session store keyed by user id

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{ConversationTurn, MAX_HISTORY, ProfileUpdate, Session, UserProfile};
use crate::{Error, Result};

type SessionCell = Arc<Mutex<Session>>;

/// Owns the mapping from user id to [`Session`]
///
/// Each session sits behind its own mutex, so requests for different users
/// proceed independently while mutations for one user are serialized.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionCell>>,
    max_history: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store bounded to [`MAX_HISTORY`] turns per session
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_history(MAX_HISTORY)
    }

    /// Create a store with a custom history bound
    ///
    /// The bound is rounded down to an even number (minimum 2) so the window
    /// always starts on a user turn.
    #[must_use]
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history: (max_history / 2 * 2).max(2),
        }
    }

    /// History bound applied after every append
    #[must_use]
    pub const fn max_history(&self) -> usize {
        self.max_history
    }

    /// Number of sessions created so far
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session has been created yet
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Return the cell for `user_id`, creating an empty session if needed
    async fn cell(&self, user_id: &str) -> SessionCell {
        if let Some(cell) = self.sessions.read().await.get(user_id) {
            return cell.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(user_id, "creating session");
                Arc::new(Mutex::new(Session::default()))
            })
            .clone()
    }

    async fn existing(&self, user_id: &str) -> Option<SessionCell> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// Return a snapshot of the session for `user_id`, creating it on first use
    pub async fn get_or_create(&self, user_id: &str) -> Session {
        let cell = self.cell(user_id).await;
        let session = cell.lock().await;
        session.clone()
    }

    /// Return a snapshot of an existing session without creating one
    ///
    /// Takes the per-user lock, so it waits while a [`SessionGuard`] for the
    /// same user is held and then sees that guard's committed turns.
    pub async fn get(&self, user_id: &str) -> Option<Session> {
        let cell = self.existing(user_id).await?;
        let session = cell.lock().await;
        Some(session.clone())
    }

    /// Acquire exclusive access to the session for `user_id`
    ///
    /// The session is created if absent. Other mutations for the same user
    /// wait until the guard is dropped.
    pub async fn lock(&self, user_id: &str) -> SessionGuard {
        let cell = self.cell(user_id).await;
        SessionGuard {
            user_id: user_id.to_string(),
            session: cell.lock_owned().await,
            max_history: self.max_history,
        }
    }

    /// Append a user turn followed by an assistant turn
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session was never created
    pub async fn append_turn(
        &self,
        user_id: &str,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<()> {
        let Some(cell) = self.existing(user_id).await else {
            tracing::error!(user_id, "append_turn called before get_or_create");
            return Err(Error::NotFound(format!("session {user_id}")));
        };

        let mut session = cell.lock().await;
        session.push_pair(
            ConversationTurn::user(user_text),
            ConversationTurn::assistant(assistant_text),
            self.max_history,
        );
        Ok(())
    }

    /// Shallow-merge `update` into the profile for `user_id`, creating the session if absent
    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> UserProfile {
        let mut guard = self.lock(user_id).await;
        guard.update_profile(update)
    }
}

/// Exclusive handle on one user's session
///
/// Holds the per-user lock for as long as it lives.
pub struct SessionGuard {
    user_id: String,
    session: OwnedMutexGuard<Session>,
    max_history: usize,
}

impl SessionGuard {
    /// User id this session belongs to
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Append a user turn followed by an assistant turn, keeping the history bound
    pub fn append_turn(&mut self, user_text: &str, assistant_text: &str) {
        self.session.push_pair(
            ConversationTurn::user(user_text),
            ConversationTurn::assistant(assistant_text),
            self.max_history,
        );
        tracing::debug!(
            user_id = %self.user_id,
            turns = self.session.history.len(),
            "appended turn pair"
        );
    }

    /// Shallow-merge `update` into the profile and return the result
    pub fn update_profile(&mut self, update: ProfileUpdate) -> UserProfile {
        self.session.profile.merge(update);
        self.session.profile.clone()
    }
}

impl Deref for SessionGuard {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}
