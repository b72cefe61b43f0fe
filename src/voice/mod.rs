//! Voice output
//!
//! Reply text is turned into audio by a hosted TTS service. Speech capture and
//! transcription happen in the browser.

mod catalog;
mod tts;

pub use catalog::{Voice, VoiceCatalog};
pub use tts::{SpeechSynthesizer, TextToSpeech, TtsProvider};
