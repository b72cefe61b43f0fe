//! Per-user conversation state
//!
//! A [`Session`] holds the bounded dialogue history and the user's profile.
//! Sessions live in the [`SessionStore`] for the lifetime of the process.

mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use store::{SessionGuard, SessionStore};

/// Maximum number of turns retained per session
pub const MAX_HISTORY: usize = 20;

/// User id used when the caller does not supply one
pub const DEFAULT_USER_ID: &str = "default";

/// Display name for a freshly created profile
pub const DEFAULT_PROFILE_NAME: &str = "User";

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion APIs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One utterance by either the user or the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a user turn stamped now
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn stamped now
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Personalization data interpolated into the system prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub memory_topics: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            preferences: Vec::new(),
            memory_topics: Vec::new(),
        }
    }
}

/// Partial profile; present fields overwrite, absent fields are kept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_topics: Option<Vec<String>>,
}

impl UserProfile {
    /// Shallow-merge `update` over this profile
    pub fn merge(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(preferences) = update.preferences {
            self.preferences = preferences;
        }
        if let Some(memory_topics) = update.memory_topics {
            self.memory_topics = memory_topics;
        }
    }
}

/// Conversation state for a single user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub history: Vec<ConversationTurn>,
    pub profile: UserProfile,
}

impl Session {
    /// Append a user/assistant pair and drop the oldest turns beyond `max_history`
    pub(crate) fn push_pair(
        &mut self,
        user: ConversationTurn,
        assistant: ConversationTurn,
        max_history: usize,
    ) {
        self.history.push(user);
        self.history.push(assistant);

        let excess = self.history.len().saturating_sub(max_history);
        if excess > 0 {
            self.history.drain(..excess);
        }
    }
}
