//! HTTP client for a running study-guide service.
//!
//! Mirrors what the form page does: one awaited `/generate` call per step,
//! each carrying every earlier response, stopping at the first failure.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, StudyGuideError};
use crate::guide::{ComponentRequest, GenerateRequest, GuideResponse, GuideSession, StepCard};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct GuideClient {
    base_url: String,
    http: reqwest::Client,
}

/// Outcome of a session run; `error` is set when the loop stopped early
#[derive(Debug)]
pub struct SessionOutcome {
    pub cards: Vec<StepCard>,
    pub error: Option<StudyGuideError>,
}

impl SessionOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

impl GuideClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn generate_step(&self, req: &GenerateRequest) -> Result<String> {
        debug!(
            "POST /generate step={} previous={}",
            req.step,
            req.previous_responses.len()
        );
        Ok(self.post("/generate", req).await?.response)
    }

    pub async fn explain(&self, req: &ComponentRequest) -> Result<String> {
        debug!("POST /get_component_details component={}", req.component);
        Ok(self.post("/get_component_details", req).await?.response)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<GuideResponse> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.http.post(&url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(StudyGuideError::Upstream {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Drive every remaining step of `session`, calling `on_card` as each arrives
    pub async fn run_session<F>(&self, session: &mut GuideSession, mut on_card: F) -> SessionOutcome
    where
        F: FnMut(&StepCard),
    {
        let mut cards = Vec::new();
        while let Some(req) = session.next_request() {
            match self.generate_step(&req).await {
                Ok(markdown) => {
                    let card = session.record(markdown);
                    info!(
                        "Received step {}/{} ({})",
                        card.step + 1,
                        session.total_steps(),
                        card.title
                    );
                    on_card(&card);
                    cards.push(card);
                }
                Err(e) => {
                    warn!("Stopping at step {}: {}", req.step + 1, e);
                    return SessionOutcome {
                        cards,
                        error: Some(e),
                    };
                }
            }
        }
        SessionOutcome { cards, error: None }
    }
}

/// Pull the message out of an `{"error": ..}` body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
