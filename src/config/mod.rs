//! Configuration management for the voice-chat gateway
//!
//! Values are layered env > TOML file > defaults.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::persona::{DEFAULT_PERSONA_ID, Persona};
use crate::session::MAX_HISTORY;
use crate::voice::{TtsProvider, Voice};
use crate::{Error, Result};

use file::VoicechatConfigFile;

/// Default OpenAI-compatible endpoint
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Default API port
pub const DEFAULT_PORT: u16 = 5000;

/// Voice-chat gateway configuration
#[derive(Debug)]
pub struct Config {
    /// Active persona
    pub persona: Persona,

    /// Language-model configuration
    pub llm: LlmConfig,

    /// Speech output configuration
    pub voice: VoiceConfig,

    /// Turns retained per user
    pub max_history: usize,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,
}

/// Language-model configuration
#[derive(Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub api_key: Option<SecretString>,
}

/// Speech output configuration
#[derive(Debug)]
pub struct VoiceConfig {
    /// Enable spoken replies
    pub enabled: bool,

    pub provider: TtsProvider,

    /// Model override; provider default when unset
    pub model: Option<String>,

    /// Base URL override; provider default when unset
    pub base_url: Option<String>,

    /// Voice used when a request names none
    pub default_voice: String,

    /// Speed multiplier (`OpenAI` only)
    pub speed: f32,

    /// Configured voices; stock voices are offered when empty
    pub voices: Vec<Voice>,

    pub api_key: Option<SecretString>,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,

    /// Global request budget per minute; unlimited when unset
    pub rate_limit_per_minute: Option<u32>,

    /// Timeout for each collaborator call
    pub collaborator_timeout: Duration,
}

impl Config {
    /// Load configuration from the environment and the standard config file
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file or the persona cannot be loaded
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let fc = match config_path {
            Some(path) => file::load_config_file_from(path)?,
            None => file::load_config_file(),
        };
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the persona cannot be loaded or a value is invalid
    pub fn from_sources(
        fc: VoicechatConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let persona = Self::load_persona(
            env("VOICECHAT_PERSONA_FILE").map(PathBuf::from).or(fc.persona_file),
            env("VOICECHAT_PERSONA").or(fc.persona),
        )?;

        let openai_key = env("OPENAI_API_KEY").or(fc.api_keys.openai);

        // LLM config (env > toml > default); a dedicated key wins over the OpenAI key
        let llm = LlmConfig {
            base_url: env("VOICECHAT_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: env("VOICECHAT_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            max_tokens: parse_env(&env, "VOICECHAT_LLM_MAX_TOKENS")?
                .or(fc.llm.max_tokens)
                .unwrap_or(1024),
            temperature: parse_env(&env, "VOICECHAT_LLM_TEMPERATURE")?
                .or(fc.llm.temperature)
                .unwrap_or(1.0),
            api_key: env("VOICECHAT_LLM_API_KEY")
                .or(fc.api_keys.llm)
                .or_else(|| openai_key.clone())
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        };

        // Voice config (env > toml > default)
        let provider_name = env("VOICECHAT_TTS_PROVIDER").or(fc.voice.provider);
        let provider = match provider_name.as_deref() {
            None => TtsProvider::OpenAI,
            Some(name) => TtsProvider::from_name(name)
                .ok_or_else(|| Error::Config(format!("unknown TTS provider: {name}")))?,
        };
        let voice_key = match provider {
            TtsProvider::OpenAI => openai_key,
            TtsProvider::ElevenLabs => env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
        };
        let voice = VoiceConfig {
            enabled: parse_bool_env(&env, "VOICECHAT_VOICE_ENABLED")
                .or(fc.voice.enabled)
                .unwrap_or(true),
            provider,
            model: env("VOICECHAT_TTS_MODEL").or(fc.voice.model),
            base_url: env("VOICECHAT_TTS_BASE_URL").or(fc.voice.base_url),
            default_voice: env("VOICECHAT_TTS_VOICE")
                .or(fc.voice.default_voice)
                .unwrap_or_else(|| default_voice_for(provider).to_string()),
            speed: parse_env(&env, "VOICECHAT_TTS_SPEED")?
                .or(fc.voice.speed)
                .unwrap_or(1.0),
            voices: fc.voice.voices,
            api_key: voice_key.filter(|k| !k.is_empty()).map(SecretString::from),
        };

        let max_history = parse_env(&env, "VOICECHAT_MAX_HISTORY")?
            .or(fc.session.max_history)
            .unwrap_or(MAX_HISTORY);

        // API server config (env > toml > default)
        let api_server = ApiServerConfig {
            port: match parse_env(&env, "VOICECHAT_PORT")? {
                Some(port) => Some(port),
                None => parse_env(&env, "PORT")?,
            }
            .or(fc.server.port)
            .unwrap_or(DEFAULT_PORT),
            cors_origin: env("CORS_ORIGIN").or(fc.server.cors_origin),
            static_dir: env("VOICECHAT_STATIC_DIR")
                .map(PathBuf::from)
                .or(fc.server.static_dir),
            rate_limit_per_minute: parse_env(&env, "VOICECHAT_RATE_LIMIT")?
                .or(fc.server.rate_limit_per_minute),
            collaborator_timeout: Duration::from_secs(
                parse_env(&env, "VOICECHAT_TIMEOUT_SECS")?
                    .or(fc.server.collaborator_timeout_secs)
                    .unwrap_or(60),
            ),
        };

        Ok(Self {
            persona,
            llm,
            voice,
            max_history,
            api_server,
        })
    }

    /// Check that everything required to serve requests is present
    ///
    /// # Errors
    ///
    /// Returns `Config` if the language-model API key is missing
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.is_none() {
            return Err(Error::Config(
                "language model API key not set (OPENAI_API_KEY or VOICECHAT_LLM_API_KEY)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Whether spoken replies can be produced
    #[must_use]
    pub fn voice_available(&self) -> bool {
        self.voice.enabled
            && self
                .voice
                .api_key
                .as_ref()
                .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Load a persona: explicit file first, then an embedded id, then the default
    fn load_persona(path: Option<PathBuf>, persona_id: Option<String>) -> Result<Persona> {
        if let Some(path) = path {
            return Persona::from_file(&path);
        }

        let persona_id = persona_id.unwrap_or_else(|| DEFAULT_PERSONA_ID.to_string());
        Persona::embedded(&persona_id)
            .map_err(|_| Error::Config(format!("unknown persona: {persona_id}")))
    }
}

/// Voice used when neither env nor file names one
const fn default_voice_for(provider: TtsProvider) -> &'static str {
    match provider {
        TtsProvider::OpenAI => "nova",
        // "Rachel"
        TtsProvider::ElevenLabs => "21m00Tcm4TlvDq8ikWAM",
    }
}

/// Parse an optional env value, failing loudly on malformed input
fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid value for {key}: {raw}")))
        })
        .transpose()
}

fn parse_bool_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    env(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
