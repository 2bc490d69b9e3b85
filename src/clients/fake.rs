use async_trait::async_trait;

use crate::clients::traits::{ChatModel, ModelError};

// Deterministic, local FakeChatModel for testing/dev (no network)
#[derive(Debug, Clone, Default)]
pub struct FakeChatModel;

impl FakeChatModel {
    pub fn new() -> Self {
        Self
    }

    fn generate(&self, system: &str, user: &str, history: &[String]) -> String {
        // First line of the user prompt doubles as the section heading
        let heading = user.lines().next().unwrap_or_default().trim();
        let items: Vec<&str> = user
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit()))
            .collect();
        let context = system
            .lines()
            .find(|l| l.trim_start().starts_with("- Subject:"))
            .map(|l| l.trim())
            .unwrap_or("");

        let mut out = format!("## {heading}\n\n");
        if !context.is_empty() {
            out.push_str(&format!("_Context: {}_\n\n", context.trim_start_matches("- ")));
        }
        for item in &items {
            out.push_str(&format!("{item}\n"));
        }
        if !items.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!(
            "Builds on {} earlier section(s). See [the Rust book](https://doc.rust-lang.org/book/) for a sample resource link.\n",
            history.len()
        ));
        out
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        history: &[String],
    ) -> Result<String, ModelError> {
        Ok(self.generate(system, user, history))
    }

    fn name(&self) -> &str {
        "fake"
    }
}
