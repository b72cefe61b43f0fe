//! Selectable TTS voices

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Built-in `OpenAI` voices offered when none are configured
const OPENAI_VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

/// A voice the client may request by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Voice {
    fn named(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
        }
    }
}

/// Voices available for synthesis plus the default choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    default_voice: String,
}

impl VoiceCatalog {
    /// Build a catalog; the default voice is added if it is not listed
    #[must_use]
    pub fn new(mut voices: Vec<Voice>, default_voice: impl Into<String>) -> Self {
        let default_voice = default_voice.into();
        if !voices.iter().any(|v| v.id == default_voice) {
            voices.insert(0, Voice::named(&default_voice));
        }
        Self {
            voices,
            default_voice,
        }
    }

    /// Catalog of the stock `OpenAI` voices
    #[must_use]
    pub fn openai(default_voice: impl Into<String>) -> Self {
        Self::new(
            OPENAI_VOICES.iter().copied().map(Voice::named).collect(),
            default_voice,
        )
    }

    /// All voices, default first when it was not configured explicitly
    #[must_use]
    pub fn list(&self) -> &[Voice] {
        &self.voices
    }

    /// Id of the voice used when a request names none
    #[must_use]
    pub fn default_voice(&self) -> &str {
        &self.default_voice
    }

    /// Resolve a requested voice id, falling back to the default
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `requested` is not in the catalog
    pub fn resolve(&self, requested: Option<&str>) -> Result<&Voice> {
        let id = requested
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.default_voice);

        self.voices
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| Error::NotFound(format!("voice {id}")))
    }
}
