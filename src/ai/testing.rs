//! Scripted completion client for tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::llm_client::CompletionClient;
use crate::error::{LuminaError, Result};

enum Script {
    Reply(String),
    Fail(LuminaError),
}

/// Returns a fixed reply (or error) and records every instruction it saw.
pub struct ScriptedClient {
    script: Script,
    seen: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Reply(reply.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: LuminaError) -> Arc<Self> {
        Arc::new(Self {
            script: Script::Fail(error),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn last_instruction(&self) -> Option<String> {
        self.seen.lock().last().cloned()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, instruction: &str) -> Result<String> {
        self.seen.lock().push(instruction.to_string());
        match &self.script {
            Script::Reply(reply) => Ok(reply.clone()),
            // Errors are not Clone; rebuild from the message
            Script::Fail(LuminaError::QuotaExceeded(m)) => Err(LuminaError::QuotaExceeded(m.clone())),
            Script::Fail(LuminaError::Upstream { status, message }) => Err(LuminaError::Upstream {
                status: *status,
                message: message.clone(),
            }),
            Script::Fail(LuminaError::EmptyCompletion) => Err(LuminaError::EmptyCompletion),
            Script::Fail(other) => Err(LuminaError::Transport(other.to_string())),
        }
    }

    fn description(&self) -> String {
        "scripted".to_string()
    }
}
