//! Request, response and session types shared by the service, the page and the CLI.
//!
//! Wire names follow the form page (`currentLevel`, `previousResponses`, ...).

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyGuideError};

/// Upper bound on steps a single submission may request
pub const MAX_STEPS: u32 = 10;

/// The form-input bag collected from the student
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyPreferences {
    pub subject: String,
    pub current_level: String,
    /// Hours per week, kept as entered
    pub time_available: String,
    pub learning_style: String,
    pub goal: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub preferences: StudyPreferences,
    pub step: u32,
    pub previous_responses: Vec<String>,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<()> {
        if self.preferences.subject.trim().is_empty() {
            return Err(StudyGuideError::validation("Missing required parameters"));
        }
        Ok(())
    }
}

/// Markdown as produced by the model plus its rendered HTML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideResponse {
    pub response: String,
    #[serde(default)]
    pub html: String,
}

impl GuideResponse {
    pub fn from_markdown(markdown: String) -> Self {
        let html = crate::markdown::render(&markdown);
        Self {
            response: markdown,
            html,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentRequest {
    pub component: String,
    pub subject: String,
}

impl ComponentRequest {
    pub fn validate(&self) -> Result<()> {
        if self.component.trim().is_empty() || self.subject.trim().is_empty() {
            return Err(StudyGuideError::validation("Missing required parameters"));
        }
        Ok(())
    }
}

/// One generated stage of the guide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCard {
    pub step: u32,
    pub title: String,
    pub markdown: String,
}

/// Transient state of one form submission.
///
/// `responses` grows in step order; the request for step `k` carries exactly
/// the responses for steps `0..k`.
#[derive(Debug, Clone)]
pub struct GuideSession {
    preferences: StudyPreferences,
    total_steps: u32,
    responses: Vec<String>,
}

impl GuideSession {
    pub fn new(preferences: StudyPreferences, steps: u32) -> Self {
        Self {
            preferences,
            total_steps: steps.clamp(1, MAX_STEPS),
            responses: Vec::new(),
        }
    }

    pub fn preferences(&self) -> &StudyPreferences {
        &self.preferences
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn completed_steps(&self) -> u32 {
        self.responses.len() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.completed_steps() >= self.total_steps
    }

    /// Request for the next outstanding step, or `None` once every step has a response
    pub fn next_request(&self) -> Option<GenerateRequest> {
        if self.is_complete() {
            return None;
        }
        Some(GenerateRequest {
            preferences: self.preferences.clone(),
            step: self.completed_steps(),
            previous_responses: self.responses.clone(),
        })
    }

    /// Record the response for the current step and return its card
    pub fn record(&mut self, response: String) -> StepCard {
        let step = self.completed_steps();
        self.responses.push(response.clone());
        StepCard {
            step,
            title: crate::prompts::step_title(step),
            markdown: response,
        }
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    /// Assemble every received step into a single Markdown document
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# Study Guide: {}\n", self.preferences.subject.trim());
        for (i, response) in self.responses.iter().enumerate() {
            out.push_str(&format!(
                "\n## Step {}: {}\n\n{}\n",
                i + 1,
                crate::prompts::step_title(i as u32),
                response.trim_end()
            ));
        }
        out
    }
}
