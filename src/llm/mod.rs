//! Language-model collaborator
//!
//! The gateway treats the model as an opaque request/response service: it
//! receives a [`Prompt`] and returns reply text. Failures are surfaced
//! unchanged and never retried.

mod openai;

use async_trait::async_trait;

use crate::Result;
use crate::prompt::Prompt;

pub use openai::{OpenAiChat, OpenAiChatConfig};

/// A service that turns a prompt into reply text
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs and status output
    fn model(&self) -> &str;

    /// Complete `prompt` and return the assistant reply
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorFailure` on transport, auth, quota or malformed
    /// responses
    async fn complete(&self, prompt: &Prompt) -> Result<String>;
}
