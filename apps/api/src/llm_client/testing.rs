//! Scripted `GenerationClient` used by unit and router tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use futures::stream;

use super::{GenerationClient, LlmError, TextStream};

#[derive(Clone)]
enum Script {
    Chunks(Vec<String>),
    FailAfter(Vec<String>, String),
    Unavailable(u16),
}

/// Replays a fixed response and records every prompt it receives.
#[derive(Clone)]
pub struct ScriptedClient {
    script: Script,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClient {
    fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn chunks(chunks: &[&str]) -> Self {
        Self::new(Script::Chunks(chunks.iter().map(|c| c.to_string()).collect()))
    }

    pub fn reply(text: &str) -> Self {
        Self::chunks(&[text])
    }

    pub fn failing_after(chunks: &[&str], reason: &str) -> Self {
        Self::new(Script::FailAfter(
            chunks.iter().map(|c| c.to_string()).collect(),
            reason.to_string(),
        ))
    }

    pub fn unavailable(status: u16) -> Self {
        Self::new(Script::Unavailable(status))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate_stream(&self, prompt: &str, _system: &str) -> Result<TextStream, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &self.script {
            Script::Chunks(chunks) => {
                let items: Vec<Result<String, LlmError>> =
                    chunks.iter().cloned().map(Ok).collect();
                Ok(Box::pin(stream::iter(items)))
            }
            Script::FailAfter(chunks, reason) => {
                let mut items: Vec<Result<String, LlmError>> =
                    chunks.iter().cloned().map(Ok).collect();
                items.push(Err(LlmError::Stream(reason.clone())));
                Ok(Box::pin(stream::iter(items)))
            }
            Script::Unavailable(status) => Err(LlmError::Api {
                status: *status,
                message: "service unavailable".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
