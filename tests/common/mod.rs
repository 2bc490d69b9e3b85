//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use study_guide::clients::{ChatModel, FakeChatModel, ModelError};
use study_guide::config::Config;
use study_guide::server::StudyGuideServer;
use tempfile::TempDir;

/// Records every call and delegates to the fake model, optionally failing from a given call on
#[derive(Default)]
pub struct RecordingModel {
    pub calls: Mutex<Vec<RecordedCall>>,
    pub fail_from_call: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub history: Vec<String>,
}

impl RecordingModel {
    pub fn failing_from(call: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_from_call: Some(call),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for RecordingModel {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        history: &[String],
    ) -> Result<String, ModelError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                system: system.to_string(),
                user: user.to_string(),
                history: history.to_vec(),
            });
            calls.len() - 1
        };
        if self.fail_from_call.is_some_and(|n| index >= n) {
            return Err(ModelError::Status {
                status: 429,
                body: "quota exceeded".to_string(),
            });
        }
        FakeChatModel::new().complete(system, user, history).await
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Server backed by `model` with its response store inside a fresh temp dir
pub fn test_server(model: Arc<dyn ChatModel>) -> (StudyGuideServer, TempDir) {
    test_server_with(model, |_| {})
}

/// Like [`test_server`], with a chance to adjust the config first
pub fn test_server_with(
    model: Arc<dyn ChatModel>,
    adjust: impl FnOnce(&mut Config),
) -> (StudyGuideServer, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.guide.responses_file = dir.path().join("saved_responses.json");
    config.guide.default_steps = 3;
    adjust(&mut config);
    (StudyGuideServer::new(config, model), dir)
}

/// Answers like the fake model, but only after `delay`
pub struct SlowModel {
    pub delay: Duration,
}

#[async_trait]
impl ChatModel for SlowModel {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        history: &[String],
    ) -> Result<String, ModelError> {
        tokio::time::sleep(self.delay).await;
        FakeChatModel::new().complete(system, user, history).await
    }

    fn name(&self) -> &str {
        "slow"
    }
}
