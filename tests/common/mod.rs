//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use voicechat_gateway::persona::DEFAULT_PERSONA_ID;
use voicechat_gateway::{
    ApiServerBuilder, Conversation, Error, LanguageModel, Persona, Prompt, PromptBuilder, Result,
    SessionStore, SpeechSynthesizer, VoiceCatalog,
};

/// Language model answering from a queue and recording every prompt
#[derive(Default)]
pub struct QueuedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl QueuedModel {
    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok((*r).to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(details: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(Error::llm(details))])),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for QueuedModel {
    fn model(&self) -> &str {
        "queued-test-model"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::llm("no scripted reply left")))
    }
}

/// Synthesizer returning `voice:text` as the "audio"
pub struct FakeSpeech;

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        Ok(format!("{voice}:{text}").into_bytes())
    }
}

/// Text-only conversation service around `model`
pub fn conversation(model: Arc<QueuedModel>) -> Conversation {
    let persona = Persona::embedded(DEFAULT_PERSONA_ID).unwrap();
    Conversation::new(Arc::new(SessionStore::new()), PromptBuilder::new(persona), model)
}

/// Conversation service with the stock voices and a fake synthesizer
pub fn spoken_conversation(model: Arc<QueuedModel>) -> Conversation {
    conversation(model).with_speech(Arc::new(FakeSpeech), VoiceCatalog::openai("nova"))
}

/// Build the API router around a conversation service
pub fn router(conversation: Conversation) -> axum::Router {
    ApiServerBuilder::new(Arc::new(conversation), 0).build().router()
}

/// Build the API router with a request budget
pub fn rate_limited_router(conversation: Conversation, per_minute: u32) -> axum::Router {
    ApiServerBuilder::new(Arc::new(conversation), 0)
        .rate_limit(Some(per_minute))
        .build()
        .router()
}
