//! Prompt assembly from session state
//!
//! [`PromptBuilder`] renders the persona template against a user's profile,
//! pairs it with the bounded history and the new utterance, and defines the
//! single path by which a model reply is folded back into the session.

use serde::Serialize;

use crate::persona::Persona;
use crate::session::{ConversationTurn, Session, SessionGuard, UserProfile};
use crate::{Error, Result};

/// Prompt handed to the language model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub history: Vec<ConversationTurn>,
    pub user: String,
}

/// Renders deterministic prompts from a persona template
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: Persona,
}

impl PromptBuilder {
    /// Create a builder for `persona`
    #[must_use]
    pub const fn new(persona: Persona) -> Self {
        Self { persona }
    }

    /// Persona whose template this builder renders
    #[must_use]
    pub const fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Render the system prompt for `profile`
    ///
    /// Lists are joined with `", "`; an empty list renders as an empty string.
    #[must_use]
    pub fn render_system_prompt(&self, profile: &UserProfile) -> String {
        let memory_topics = profile.memory_topics.join(", ");
        let preferences = profile.preferences.join(", ");

        render_template(
            &self.persona.template,
            &[
                ("name", profile.name.as_str()),
                ("memory_topics", memory_topics.as_str()),
                ("preferences", preferences.as_str()),
            ],
        )
    }

    /// Build the prompt for a new utterance without touching the session
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `utterance` is empty or whitespace-only
    pub fn build_prompt(&self, session: &Session, utterance: &str) -> Result<Prompt> {
        validate_utterance(utterance)?;

        Ok(Prompt {
            system: self.render_system_prompt(&session.profile),
            history: session.history.clone(),
            user: utterance.to_string(),
        })
    }

    /// Fold a model reply into the session as a (user, assistant) turn pair
    pub fn commit_reply(session: &mut SessionGuard, utterance: &str, reply: &str) {
        session.append_turn(utterance, reply);
    }
}

/// Reject empty or whitespace-only utterances
///
/// # Errors
///
/// Returns `InvalidInput` for blank text
pub fn validate_utterance(utterance: &str) -> Result<()> {
    if utterance.trim().is_empty() {
        return Err(Error::InvalidInput("text is required".to_string()));
    }
    Ok(())
}

/// Substitute `{key}` slots in a single left-to-right pass
///
/// Substituted values are never re-scanned, so profile text containing braces
/// is inserted verbatim. Unknown slots are left untouched.
fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let slot = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });

        match slot {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
