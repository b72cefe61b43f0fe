//! Request flow for one spoken exchange
//!
//! Lock the user's session, build the prompt, await the language model, and
//! commit the turn pair only once every collaborator call has succeeded. The
//! per-user lock is held across the model call, so concurrent requests from
//! the same user are answered one after another against up-to-date history.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::llm::{LanguageModel, OpenAiChat, OpenAiChatConfig};
use crate::prompt::{Prompt, PromptBuilder, validate_utterance};
use crate::session::{DEFAULT_USER_ID, ProfileUpdate, Session, SessionStore, UserProfile};
use crate::voice::{SpeechSynthesizer, TextToSpeech, TtsProvider, VoiceCatalog};
use crate::{Error, Result};

/// Default timeout for a single collaborator call
pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(60);

/// Text reply for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// User id the exchange was recorded under
    pub conversation_id: String,
    pub text: String,
}

/// Reply rendered to speech
#[derive(Debug, Clone)]
pub struct SpokenReply {
    pub reply: Reply,
    pub voice: String,
    /// MP3 audio bytes
    pub audio: Vec<u8>,
}

struct Speech {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voices: VoiceCatalog,
}

/// Coordinates the session store, prompt builder and collaborators
pub struct Conversation {
    store: Arc<SessionStore>,
    prompts: PromptBuilder,
    llm: Arc<dyn LanguageModel>,
    speech: Option<Speech>,
    timeout: Duration,
}

/// Apply the `"default"` user id when the caller supplied none
///
/// Ids are opaque: anything but a missing or empty id is used verbatim.
#[must_use]
pub fn resolve_user_id(user_id: Option<&str>) -> String {
    user_id
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string()
}

impl Conversation {
    /// Create a text-only conversation service
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        prompts: PromptBuilder,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            store,
            prompts,
            llm,
            speech: None,
            timeout: DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }

    /// Wire the configured collaborators
    ///
    /// Speech output is enabled only when voice is on and a TTS key is set.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the language-model key is missing or a client
    /// cannot be built
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let speech_enabled = config.voice_available();
        let Config {
            persona,
            llm,
            voice,
            max_history,
            api_server,
        } = config;

        let api_key = llm
            .api_key
            .ok_or_else(|| Error::Config("language model API key not set".to_string()))?;
        let chat = OpenAiChat::new(OpenAiChatConfig {
            base_url: llm.base_url,
            api_key,
            model: llm.model,
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            timeout: api_server.collaborator_timeout,
        })?;

        let store = Arc::new(SessionStore::with_max_history(max_history));
        let mut conversation = Self::new(store, PromptBuilder::new(persona), Arc::new(chat))
            .with_timeout(api_server.collaborator_timeout);

        match voice.api_key {
            Some(key) if speech_enabled => {
                let provider = voice.provider;
                let tts = TextToSpeech::new(
                    provider,
                    key,
                    voice.model,
                    voice.base_url,
                    voice.speed,
                )?;
                let voices = if voice.voices.is_empty() && provider == TtsProvider::OpenAI {
                    VoiceCatalog::openai(voice.default_voice)
                } else {
                    VoiceCatalog::new(voice.voices, voice.default_voice)
                };
                tracing::info!(
                    provider = ?provider,
                    voices = voices.list().len(),
                    "speech output enabled"
                );
                conversation = conversation.with_speech(Arc::new(tts), voices);
            }
            _ => tracing::warn!("speech output disabled: voice off or no TTS API key"),
        }

        Ok(conversation)
    }

    /// Enable spoken replies
    #[must_use]
    pub fn with_speech(
        mut self,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        voices: VoiceCatalog,
    ) -> Self {
        self.speech = Some(Speech { synthesizer, voices });
        self
    }

    /// Set the timeout applied to each collaborator call
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Session store backing this service
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Prompt builder in use
    #[must_use]
    pub const fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Model identifier of the language-model collaborator
    #[must_use]
    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Voice catalog, if speech output is configured
    #[must_use]
    pub fn voices(&self) -> Option<&VoiceCatalog> {
        self.speech.as_ref().map(|s| &s.voices)
    }

    /// Answer `text` for `user_id` and record the exchange
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for blank text (no collaborator is called) and
    /// `CollaboratorFailure` if the model call fails or times out; in both
    /// cases the session is left unchanged.
    pub async fn respond(&self, user_id: Option<&str>, text: &str) -> Result<Reply> {
        validate_utterance(text)?;
        let user_id = resolve_user_id(user_id);

        let mut session = self.store.lock(&user_id).await;
        let prompt = self.prompts.build_prompt(&session, text)?;
        let reply = self.complete(&user_id, &prompt).await?;

        PromptBuilder::commit_reply(&mut session, text, &reply);
        tracing::info!(
            user_id = %user_id,
            turns = session.history.len(),
            "conversation turn committed"
        );

        Ok(Reply {
            conversation_id: user_id,
            text: reply,
        })
    }

    /// Answer `text` and synthesize the reply with the requested voice
    ///
    /// The voice is resolved before the model is called. The exchange is
    /// committed only after synthesis succeeds.
    ///
    /// # Errors
    ///
    /// Returns `Config` if speech output is not configured, `NotFound` for an
    /// unknown voice, and the same errors as [`Self::respond`]
    pub async fn respond_with_audio(
        &self,
        user_id: Option<&str>,
        text: &str,
        voice_id: Option<&str>,
    ) -> Result<SpokenReply> {
        let speech = self
            .speech
            .as_ref()
            .ok_or_else(|| Error::Config("text-to-speech is not configured".to_string()))?;
        validate_utterance(text)?;
        let voice = speech.voices.resolve(voice_id)?.id.clone();
        let user_id = resolve_user_id(user_id);

        let mut session = self.store.lock(&user_id).await;
        let prompt = self.prompts.build_prompt(&session, text)?;
        let reply = self.complete(&user_id, &prompt).await?;

        let audio = tokio::time::timeout(
            self.timeout,
            speech.synthesizer.synthesize(&reply, &voice),
        )
        .await
        .map_err(|_| Error::tts(format!("timed out after {}s", self.timeout.as_secs())))??;

        PromptBuilder::commit_reply(&mut session, text, &reply);
        tracing::info!(
            user_id = %user_id,
            voice = %voice,
            bytes = audio.len(),
            "spoken conversation turn committed"
        );

        Ok(SpokenReply {
            reply: Reply {
                conversation_id: user_id,
                text: reply,
            },
            voice,
            audio,
        })
    }

    /// Merge a partial profile for `user_id`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `user_id` is empty
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile> {
        if user_id.is_empty() {
            return Err(Error::InvalidInput("userId is required".to_string()));
        }

        let profile = self.store.update_profile(user_id, update).await;
        tracing::info!(user_id, name = %profile.name, "profile updated");
        Ok(profile)
    }

    /// Snapshot of an existing session
    ///
    /// Reads take the per-user lock, so they wait for an in-flight exchange
    /// for the same user (at most one collaborator timeout) and then observe
    /// its committed turns.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no session exists for `user_id`
    pub async fn session(&self, user_id: &str) -> Result<Session> {
        self.store
            .get(user_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("conversation {user_id}")))
    }

    async fn complete(&self, user_id: &str, prompt: &Prompt) -> Result<String> {
        let started = std::time::Instant::now();
        let result = tokio::time::timeout(self.timeout, self.llm.complete(prompt))
            .await
            .map_err(|_| Error::llm(format!("timed out after {}s", self.timeout.as_secs())))?;

        match &result {
            Ok(reply) => tracing::debug!(
                user_id,
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                chars = reply.len(),
                "language model replied"
            ),
            Err(e) => tracing::warn!(user_id, error = %e, "language model call failed"),
        }

        result
    }
}
