//! Saved model responses keyed by subject and step.
//!
//! File layout: `{ "<subject>": { "<step>": { "response": .., "timestamp": .. } } }`.
//! Read and write failures are logged and never fail a request.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedResponse {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

type SavedResponses = BTreeMap<String, BTreeMap<String, SavedResponse>>;

pub struct ResponseStore {
    path: PathBuf,
    enabled: bool,
    write_lock: Mutex<()>,
}

impl ResponseStore {
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Saved response for `(subject, step)`, if any
    pub async fn get(&self, subject: &str, step: u32) -> Option<String> {
        if !self.enabled {
            return None;
        }
        match self.load().await {
            Ok(all) => all
                .get(subject)
                .and_then(|steps| steps.get(&step.to_string()))
                .map(|saved| saved.response.clone()),
            Err(e) => {
                error!("Error loading responses from {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub async fn save(&self, subject: &str, step: u32, response: &str) {
        if !self.enabled {
            return;
        }
        match self.try_save(subject, step, response).await {
            Ok(()) => info!("Saved response for {} step {}", subject, step),
            Err(e) => error!("Error saving response: {}", e),
        }
    }

    async fn try_save(&self, subject: &str, step: u32, response: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        // A corrupt file is replaced rather than blocking new saves
        let mut all = match self.load().await {
            Ok(all) => all,
            Err(e) => {
                error!("Discarding unreadable {}: {}", self.path.display(), e);
                SavedResponses::new()
            }
        };
        all.entry(subject.to_string()).or_default().insert(
            step.to_string(),
            SavedResponse {
                response: response.to_string(),
                timestamp: Utc::now(),
            },
        );

        let json = serde_json::to_string_pretty(&all)?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Full contents of the store; a missing file is an empty store
    pub async fn load(&self) -> Result<SavedResponses> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(SavedResponses::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No saved responses at {}", self.path.display());
                Ok(SavedResponses::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResponseStore::new(dir.path().join("saved.json"), true);

        assert_eq!(store.get("Rust", 0).await, None);
        store.save("Rust", 0, "# Intro").await;
        store.save("Rust", 1, "# Next").await;
        store.save("Go", 0, "# Go intro").await;

        assert_eq!(store.get("Rust", 0).await.as_deref(), Some("# Intro"));
        assert_eq!(store.get("Rust", 1).await.as_deref(), Some("# Next"));
        assert_eq!(store.get("Go", 0).await.as_deref(), Some("# Go intro"));
        assert_eq!(store.get("Go", 1).await, None);
    }

    #[tokio::test]
    async fn file_layout_is_subject_then_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let store = ResponseStore::new(&path, true);
        store.save("Physics", 2, "body").await;

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["Physics"]["2"]["response"], "body");
        assert!(raw["Physics"]["2"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn resave_replaces_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResponseStore::new(dir.path().join("saved.json"), true);
        store.save("Art", 0, "old").await;
        store.save("Art", 0, "new").await;
        assert_eq!(store.get("Art", 0).await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_miss_and_is_replaced_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = ResponseStore::new(&path, true);

        assert_eq!(store.get("Art", 0).await, None);
        store.save("Art", 0, "fresh").await;
        assert_eq!(store.get("Art", 0).await.as_deref(), Some("fresh"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_keep_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ResponseStore::new(dir.path().join("saved.json"), true));

        let mut tasks = tokio::task::JoinSet::new();
        for step in 0..20u32 {
            let store = store.clone();
            tasks.spawn(async move {
                store.save("Biology", step, &format!("# Step {step}")).await;
            });
        }
        while let Some(res) = tasks.join_next().await {
            res.unwrap();
        }

        let all = store.load().await.unwrap();
        assert_eq!(all["Biology"].len(), 20);
        for step in 0..20u32 {
            assert_eq!(
                store.get("Biology", step).await,
                Some(format!("# Step {step}"))
            );
        }
        assert!(!dir.path().join("saved.json.tmp").exists());
    }

    #[tokio::test]
    async fn disabled_store_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let store = ResponseStore::new(&path, false);
        store.save("Art", 0, "x").await;
        assert!(!path.exists());
        assert_eq!(store.get("Art", 0).await, None);
    }
}
