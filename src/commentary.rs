//! End-of-run commentary from a remote text-generation service.
//!
//! Requests run on a background thread and report back over a channel, so
//! the frame loop never waits on the network. Any failure turns into a
//! fixed fallback line; nothing here can fail the game.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use serde::Deserialize;
use serde_json::json;

use crate::config::CommentaryConfig;
use crate::error::CommentaryError;

/// Shown when the service answers with nothing.
pub const EMPTY_FALLBACK: &str = "Couldn't reach the AI commentator...";
/// Shown when the request fails outright.
pub const ERROR_FALLBACK: &str = "The AI announcer is taking a nap, but you played great (or not)!";
/// Shown when commentary is switched off.
pub const DISABLED_TEXT: &str = "Keep flying!";

pub trait Commentator: Send + Sync {
    fn comment(&self, score: u32) -> Result<String, CommentaryError>;
}

/// Never fails: errors and blank answers become the fallback lines.
pub fn comment_or_fallback(commentator: &dyn Commentator, score: u32) -> String {
    match commentator.comment(score) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) | Err(CommentaryError::EmptyResponse) => {
            tracing::warn!(score, "commentary came back empty");
            EMPTY_FALLBACK.to_string()
        }
        Err(e) => {
            tracing::warn!(score, error = %e, "commentary request failed");
            ERROR_FALLBACK.to_string()
        }
    }
}

pub fn prompt(score: u32, language: &str) -> String {
    format!(
        "The user just finished playing a Flappy Bird clone game.\n\
         Their score was: {score}.\n\
         \n\
         Scores reference:\n\
         0-2: Terrible.\n\
         3-10: Average.\n\
         10-20: Good.\n\
         20+: Legend.\n\
         \n\
         Act as a funny, slightly sarcastic, but encouraging game announcer.\n\
         Write a ONE sentence reaction to their score in {language}."
    )
}

// ── Gemini ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, all parts joined.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

/// Talks to the Gemini `generateContent` REST endpoint.
pub struct GeminiCommentator {
    config: CommentaryConfig,
    agent: ureq::Agent,
}

impl GeminiCommentator {
    pub fn new(config: CommentaryConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl Commentator for GeminiCommentator {
    fn comment(&self, score: u32) -> Result<String, CommentaryError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(CommentaryError::MissingApiKey)?;

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt(score, &self.config.language) }] }]
        });

        let response: GenerateResponse = self
            .agent
            .post(&self.url())
            .set("x-goog-api-key", key)
            .send_json(body)
            .map_err(Box::new)?
            .into_json()?;

        response.text().ok_or(CommentaryError::EmptyResponse)
    }
}

// ── Background delivery ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commentary {
    /// Nothing asked for this run yet.
    Idle,
    Pending,
    Ready(String),
}

/// Runs commentary requests off the frame loop. Only the answer for the
/// current run is kept; late answers for earlier runs are dropped.
pub struct CommentaryDesk {
    commentator: Option<Arc<dyn Commentator>>,
    tx: Sender<(u64, String)>,
    rx: Receiver<(u64, String)>,
    current_run: u64,
    state: Commentary,
}

impl CommentaryDesk {
    pub fn new(commentator: Arc<dyn Commentator>) -> Self {
        Self::with(Some(commentator))
    }

    /// Every request answers [`DISABLED_TEXT`] immediately.
    pub fn disabled() -> Self {
        Self::with(None)
    }

    fn with(commentator: Option<Arc<dyn Commentator>>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            commentator,
            tx,
            rx,
            current_run: 0,
            state: Commentary::Idle,
        }
    }

    /// A new run started; whatever is in flight no longer matters.
    pub fn begin_run(&mut self, run: u64) {
        self.current_run = run;
        self.state = Commentary::Idle;
    }

    /// Asks for a reaction to `score`. Returns immediately.
    pub fn request(&mut self, run: u64, score: u32) {
        self.current_run = run;
        let Some(commentator) = self.commentator.clone() else {
            self.state = Commentary::Ready(DISABLED_TEXT.to_string());
            return;
        };

        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("commentary".to_string())
            .spawn(move || {
                let text = comment_or_fallback(commentator.as_ref(), score);
                // The desk may be gone by now.
                let _ = tx.send((run, text));
            });

        match spawned {
            Ok(_) => {
                tracing::info!(run, score, "commentary requested");
                self.state = Commentary::Pending;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not spawn commentary thread");
                self.state = Commentary::Ready(ERROR_FALLBACK.to_string());
            }
        }
    }

    /// Picks up any answers that arrived since the last call.
    pub fn poll(&mut self) -> &Commentary {
        while let Ok((run, text)) = self.rx.try_recv() {
            if run == self.current_run && self.state == Commentary::Pending {
                tracing::info!(run, "commentary received");
                self.state = Commentary::Ready(text);
            } else {
                tracing::debug!(run, current = self.current_run, "dropping stale commentary");
            }
        }
        &self.state
    }

    pub fn state(&self) -> &Commentary {
        &self.state
    }
}
