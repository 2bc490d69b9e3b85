//! Server module containing the StudyGuideServer implementation

use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::{ChatModel, create_chat_model};
use crate::config::Config;
use crate::error::Result;
use crate::guide::{ComponentRequest, GenerateRequest};
use crate::prompts;
use crate::store::ResponseStore;

/// Shared service state: configuration, the chat model and the response store
#[derive(Clone)]
pub struct StudyGuideServer {
    pub config: Arc<Config>,
    pub model: Arc<dyn ChatModel>,
    pub store: Arc<ResponseStore>,
}

impl StudyGuideServer {
    pub fn new(config: Config, model: Arc<dyn ChatModel>) -> Self {
        let store = ResponseStore::new(
            config.guide.responses_file.clone(),
            config.guide.cache_responses,
        );
        Self {
            config: Arc::new(config),
            model,
            store: Arc::new(store),
        }
    }

    /// Build the server with the chat model selected from configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let model = create_chat_model(&config)?;
        Ok(Self::new(config, model))
    }

    /// Markdown for one step of the guide, served from the store when available
    pub async fn generate_step(&self, req: &GenerateRequest) -> Result<String> {
        req.validate()?;
        let subject = req.preferences.subject.as_str();

        if let Some(saved) = self.store.get(subject, req.step).await {
            info!("Using saved response for {} step {}", subject, req.step);
            return Ok(saved);
        }

        info!("No saved response for {} step {}, generating", subject, req.step);
        debug!(
            "Generating {} step {} with {} previous response(s)",
            subject,
            req.step,
            req.previous_responses.len()
        );
        let system = prompts::system_prompt(&req.preferences);
        let user = prompts::step_prompt(req.step, subject);
        let response = self
            .model
            .complete(&system, &user, &req.previous_responses)
            .await?;

        self.store.save(subject, req.step, &response).await;
        Ok(response)
    }

    /// Explanation of a term selected inside a step card
    pub async fn explain(&self, req: &ComponentRequest) -> Result<String> {
        req.validate()?;
        info!("Explaining '{}' for {}", req.component.trim(), req.subject.trim());
        let system = prompts::component_system_prompt(&req.subject);
        let user = prompts::component_prompt(&req.component, &req.subject);
        Ok(self.model.complete(&system, &user, &[]).await?)
    }
}
