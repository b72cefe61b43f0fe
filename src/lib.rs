//! Voicechat Gateway - conversation backend for browser voice chat
//!
//! The browser captures and transcribes speech; this crate turns each
//! utterance into a persona-conditioned reply:
//! - Per-user sessions with bounded history and a profile
//! - System prompt rendered from a persona template and the user's profile
//! - Replies from an OpenAI-compatible chat model, optionally spoken via TTS
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Browser client                       │
//! │   Mic  │  Speech recognition  │  Audio playback     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ JSON / audio/mpeg
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Voicechat Gateway                    │
//! │   API  │  Conversation  │  Sessions  │  Prompts     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │               Collaborators                          │
//! │   Chat completions  │  TTS (OpenAI / ElevenLabs)    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod persona;
pub mod prompt;
pub mod session;
pub mod voice;

pub use api::{ApiServer, ApiServerBuilder};
pub use config::Config;
pub use conversation::{Conversation, Reply, SpokenReply};
pub use error::{Error, Result};
pub use llm::{LanguageModel, OpenAiChat, OpenAiChatConfig};
pub use persona::Persona;
pub use prompt::{Prompt, PromptBuilder};
pub use session::{ConversationTurn, ProfileUpdate, Role, Session, SessionStore, UserProfile};
pub use voice::{SpeechSynthesizer, TextToSpeech, TtsProvider, Voice, VoiceCatalog};
