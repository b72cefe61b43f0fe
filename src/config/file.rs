//! TOML configuration file loading
//!
//! Supports `~/.config/voicechat/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::voice::Voice;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct VoicechatConfigFile {
    /// Embedded persona id (e.g. "sarah")
    #[serde(default)]
    pub persona: Option<String>,

    /// Path to a persona JSON/TOML file; wins over `persona`
    #[serde(default)]
    pub persona_file: Option<PathBuf>,

    /// Language-model configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech output configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Language-model configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// OpenAI-compatible base URL
    pub base_url: Option<String>,

    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    pub max_tokens: Option<u32>,

    pub temperature: Option<f32>,
}

/// Speech output configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable spoken replies
    pub enabled: Option<bool>,

    /// TTS provider ("openai" or "elevenlabs")
    pub provider: Option<String>,

    /// TTS model override
    pub model: Option<String>,

    /// TTS API base URL override
    pub base_url: Option<String>,

    /// Voice used when a request names none
    pub default_voice: Option<String>,

    /// TTS speed multiplier
    pub speed: Option<f32>,

    /// Voices clients may choose from
    #[serde(default)]
    pub voices: Vec<Voice>,
}

/// Session configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Turns retained per user
    pub max_history: Option<usize>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
    /// Key for the language model when it is not the `OpenAI` key
    pub llm: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,

    /// Directory of the built web client
    pub static_dir: Option<PathBuf>,

    /// Global request budget per minute
    pub rate_limit_per_minute: Option<u32>,

    /// Timeout for each language-model / TTS call, in seconds
    pub collaborator_timeout_secs: Option<u64>,
}

/// Load an explicitly requested config file
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_config_file_from(path: &Path) -> Result<VoicechatConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the TOML config file from the standard path
///
/// Returns `VoicechatConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> VoicechatConfigFile {
    let Some(path) = config_file_path() else {
        return VoicechatConfigFile::default();
    };

    if !path.exists() {
        return VoicechatConfigFile::default();
    }

    load_config_file_from(&path).unwrap_or_else(|e| {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to load config file, using defaults"
        );
        VoicechatConfigFile::default()
    })
}

/// Return the config file path: `~/.config/voicechat/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.config_dir().join("voicechat").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_partial_file() {
        let config: VoicechatConfigFile = toml::from_str(
            r#"
persona = "sarah"

[llm]
model = "gpt-4o"

[voice]
provider = "elevenlabs"
default_voice = "rachel"

[[voice.voices]]
id = "rachel"
name = "Rachel"
description = "calm narrator"

[server]
port = 8080
"#,
        )
        .unwrap();

        assert_eq!(config.persona.as_deref(), Some("sarah"));
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o"));
        assert!(config.llm.base_url.is_none());
        assert_eq!(config.voice.voices.len(), 1);
        assert_eq!(config.voice.voices[0].name, "Rachel");
        assert_eq!(config.server.port, Some(8080));
        assert!(config.session.max_history.is_none());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: VoicechatConfigFile = toml::from_str("").unwrap();
        assert!(config.persona.is_none());
        assert!(config.voice.voices.is_empty());
    }

    #[test]
    fn explicit_file_parse_error_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[server\nport = 1").unwrap();
        assert!(load_config_file_from(file.path()).is_err());
    }
}
