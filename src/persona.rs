//! Persona configuration
//!
//! A persona carries the system-prompt template for the assistant. The
//! template is configuration: it is loaded once at startup and rendered per
//! request by [`PromptBuilder`](crate::prompt::PromptBuilder).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Placeholders a persona template may interpolate
pub const TEMPLATE_PLACEHOLDERS: &[&str] = &["name", "memory_topics", "preferences"];

/// Persistent assistant persona
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Short description shown in status output
    #[serde(default)]
    pub description: Option<String>,

    /// System prompt template with `{name}`, `{memory_topics}` and `{preferences}` slots
    pub template: String,
}

/// Embedded personas compiled into the binary
const EMBEDDED_PERSONAS: &[(&str, &str)] =
    &[("sarah", include_str!("../personas/sarah.json"))];

/// Default persona id
pub const DEFAULT_PERSONA_ID: &str = "sarah";

impl Persona {
    /// Load an embedded persona compiled into the binary
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no embedded persona has this id
    pub fn embedded(persona_id: &str) -> Result<Self> {
        let (_, json) = EMBEDDED_PERSONAS
            .iter()
            .find(|(id, _)| *id == persona_id)
            .ok_or_else(|| Error::NotFound(format!("persona {persona_id}")))?;
        Ok(serde_json::from_str(json)?)
    }

    /// Load a persona from a JSON or TOML file, chosen by extension
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let persona: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };

        let missing = persona.missing_placeholders();
        if !missing.is_empty() {
            tracing::warn!(
                path = %path.display(),
                ?missing,
                "persona template does not interpolate every profile field"
            );
        }

        tracing::info!(persona_id = %persona.id, path = %path.display(), "loaded persona");
        Ok(persona)
    }

    /// Placeholders not referenced by the template
    #[must_use]
    pub fn missing_placeholders(&self) -> Vec<&'static str> {
        TEMPLATE_PLACEHOLDERS
            .iter()
            .copied()
            .filter(|p| !self.template.contains(&format!("{{{p}}}")))
            .collect()
    }
}
