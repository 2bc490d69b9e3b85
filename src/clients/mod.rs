pub mod fake;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, StudyGuideError};

pub use fake::FakeChatModel;
pub use openai::OpenAiChatModel;
pub use traits::{ChatModel, ModelError};

fn is_placeholder(key: &str) -> bool {
    let t = key.trim();
    t.is_empty()
        || t.contains("${")
        || t.eq_ignore_ascii_case("your-api-key-here")
        || t.eq_ignore_ascii_case("changeme")
}

/// Pick the chat model for this process.
///
/// A usable OPENAI_API_KEY selects the OpenAI-compatible client. Without one,
/// strict mode fails and otherwise the deterministic fake model is used.
pub fn create_chat_model(config: &Config) -> Result<Arc<dyn ChatModel>> {
    let key = config
        .runtime
        .openai_api_key
        .as_deref()
        .filter(|k| !is_placeholder(k));

    if let Some(key) = key {
        info!(
            "Using OpenAI-compatible chat model (model={}, base_url={})",
            config.model.name, config.model.base_url
        );
        let model = OpenAiChatModel::new(key.to_string(), &config.model)?;
        return Ok(Arc::new(model));
    }

    if config.model.strict {
        return Err(StudyGuideError::Config {
            message: "No chat model configured; set OPENAI_API_KEY or disable strict mode"
                .to_string(),
        });
    }

    warn!("OPENAI_API_KEY not set, using deterministic FakeChatModel");
    Ok(Arc::new(FakeChatModel::new()))
}
