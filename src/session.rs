//! Conversational sessions: per-session transcripts and follow-up chat.
//!
//! Sessions live in memory, keyed by the client-supplied id, with no expiry.
//! Each transcript sits behind its own async mutex: two questions on the same
//! session are answered one after the other so the second sees the first
//! exchange, while other sessions proceed independently.

use crate::config::InsightConfig;
use crate::error::InsightError;
use crate::pipeline::llm::{complete_with_retry, CompletionBackend, Prompt};
use crate::pipeline::postprocess::clean_reply;
use crate::prompts::{chat_prompt, patient_context, DEFAULT_CHAT_PROMPT};
use crate::report::{TestResults, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Session id used when the client does not send one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// One question and the reply it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub reply: String,
}

/// Ordered turns of one conversation.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn push(&mut self, question: impl Into<String>, reply: impl Into<String>) {
        self.turns.push(Turn {
            question: question.into(),
            reply: reply.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

type SharedTranscript = Arc<tokio::sync::Mutex<Transcript>>;

/// A chat question with the context it should be answered against.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
    pub profile: UserProfile,
    pub test_data: TestResults,
}

/// The answer to a [`ChatRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub session_id: String,
    pub response: String,
}

/// In-memory map of session id → transcript.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SharedTranscript>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript for `session_id`, created empty on first use.
    fn transcript(&self, session_id: &str) -> SharedTranscript {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Transcript::default()))),
        )
    }

    /// Number of sessions that have been opened.
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the turns recorded for `session_id`; empty for unknown ids.
    pub async fn history(&self, session_id: &str) -> Vec<Turn> {
        let existing = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned();
        match existing {
            Some(t) => t.lock().await.turns().to_vec(),
            None => Vec::new(),
        }
    }

    /// Drop a session. Returns true if it existed.
    ///
    /// Waits for an in-flight turn on the session to finish, then clears the
    /// transcript in place. The entry is removed only when no other request
    /// holds it, so a question queued behind the reset still runs after it on
    /// the same transcript.
    pub async fn reset(&self, session_id: &str) -> bool {
        let existing = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned();
        let Some(transcript) = existing else {
            return false;
        };

        let mut guard = transcript.lock().await;
        guard.clear();

        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let unshared = sessions
            .get(session_id)
            .is_some_and(|t| Arc::ptr_eq(t, &transcript) && Arc::strong_count(t) == 2);
        if unshared {
            sessions.remove(session_id);
        }
        true
    }

    /// Answer one question, recording the exchange on success.
    ///
    /// The transcript is locked for the whole call so concurrent questions on
    /// one session are answered in arrival order. A failed call records nothing.
    pub async fn chat(
        &self,
        backend: &dyn CompletionBackend,
        request: &ChatRequest,
        config: &InsightConfig,
    ) -> Result<ChatReply, InsightError> {
        let session_id = request
            .session_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SESSION_ID)
            .to_string();

        let transcript = self.transcript(&session_id);
        let mut transcript = transcript.lock().await;

        let preamble = config.chat_prompt.as_deref().unwrap_or(DEFAULT_CHAT_PROMPT);
        let context = patient_context(&request.profile, &request.test_data);
        let text = chat_prompt(preamble, &context, transcript.turns(), &request.message);
        debug!(
            "Chat prompt for session {}: {} prior turns, {} chars",
            session_id,
            transcript.len(),
            text.len()
        );

        let prompt = Prompt::user(text, config.chat_temperature, config.max_tokens);
        let completion = complete_with_retry(backend, &prompt, config, "chat").await?;
        let response = clean_reply(&completion.content);

        transcript.push(request.message.clone(), response.clone());
        info!(
            "Session {}: answered turn {}",
            session_id,
            transcript.len()
        );

        Ok(ChatReply {
            session_id,
            response,
        })
    }
}
