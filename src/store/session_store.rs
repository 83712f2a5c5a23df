use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    log_error, log_warn,
    session::{Screen, Settings},
};

use super::{keys, KeyValueStore, Record};

const ENABLE_LOGS: bool = true;

/// Session fields as found in storage. Every field is optional; callers
/// decide the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    pub screen: Option<Screen>,
    pub study_minutes: Option<u32>,
    pub pause_minutes: Option<u32>,
    pub cycles: Option<u32>,
    pub current_cycle: Option<u32>,
    pub duration_focus: Option<u64>,
    pub duration_pause: Option<u64>,
    pub start_time: Option<i64>,
    pub blocked_websites: Option<Vec<String>>,
}

impl StoredSession {
    /// Settings with defaults filled in and values clamped to at least 1.
    pub fn settings_or(&self, defaults: Settings) -> Settings {
        Settings {
            study_minutes: self.study_minutes.unwrap_or(defaults.study_minutes),
            pause_minutes: self.pause_minutes.unwrap_or(defaults.pause_minutes),
            cycles: self.cycles.unwrap_or(defaults.cycles),
        }
        .clamped()
    }
}

/// A partial write. Only `Some` fields reach storage.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SessionPatch {
    #[serde(rename = "screen", skip_serializing_if = "Option::is_none")]
    pub screen: Option<Screen>,
    #[serde(rename = "studyTimeMinutes", skip_serializing_if = "Option::is_none")]
    pub study_minutes: Option<u32>,
    #[serde(rename = "pauseTimeMinutes", skip_serializing_if = "Option::is_none")]
    pub pause_minutes: Option<u32>,
    #[serde(rename = "cycles", skip_serializing_if = "Option::is_none")]
    pub cycles: Option<u32>,
    #[serde(rename = "currentCycle", skip_serializing_if = "Option::is_none")]
    pub current_cycle: Option<u32>,
    #[serde(rename = "durationFocus", skip_serializing_if = "Option::is_none")]
    pub duration_focus: Option<u64>,
    #[serde(rename = "durationPause", skip_serializing_if = "Option::is_none")]
    pub duration_pause: Option<u64>,
    #[serde(rename = "startTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(rename = "blocked_websites", skip_serializing_if = "Option::is_none")]
    pub blocked_websites: Option<Vec<String>>,
}

impl SessionPatch {
    pub fn screen(screen: Screen) -> Self {
        Self {
            screen: Some(screen),
            ..Self::default()
        }
    }

    pub fn blocked_websites(domains: Vec<String>) -> Self {
        Self {
            blocked_websites: Some(domains),
            ..Self::default()
        }
    }

    pub fn into_record(self) -> Record {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Record::new(),
        }
    }
}

/// Typed access to the persisted session. Failures are logged and never
/// propagated: reads fall back to an empty [`StoredSession`], writes leave
/// the in-memory session authoritative.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub async fn load(&self) -> StoredSession {
        let record = match self.backend.get(&keys::ALL).await {
            Ok(record) => record,
            Err(err) => {
                log_error!("Failed to read session from storage, using defaults: {err:#}");
                return StoredSession::default();
            }
        };

        StoredSession {
            screen: field(&record, keys::SCREEN),
            study_minutes: field(&record, keys::STUDY_MINUTES),
            pause_minutes: field(&record, keys::PAUSE_MINUTES),
            cycles: field(&record, keys::CYCLES),
            current_cycle: field(&record, keys::CURRENT_CYCLE),
            duration_focus: field(&record, keys::DURATION_FOCUS),
            duration_pause: field(&record, keys::DURATION_PAUSE),
            start_time: field(&record, keys::START_TIME),
            blocked_websites: field(&record, keys::BLOCKED_WEBSITES),
        }
    }

    pub async fn save(&self, patch: SessionPatch) {
        let record = patch.into_record();
        if record.is_empty() {
            return;
        }
        if let Err(err) = self.backend.set(record).await {
            log_error!("Failed to persist session fields: {err:#}");
        }
    }
}

/// Decode one key. `null` and wrong-typed values count as missing.
fn field<T: DeserializeOwned>(record: &Record, key: &str) -> Option<T> {
    let value = record.get(key)?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            log_warn!("Ignoring stored '{key}' ({value}): {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _keys: &[&str]) -> Result<Record> {
            Err(anyhow!("storage unavailable"))
        }

        async fn set(&self, _items: Record) -> Result<()> {
            Err(anyhow!("storage unavailable"))
        }
    }

    #[test]
    fn patch_only_writes_present_keys() {
        let record = SessionPatch {
            screen: Some(Screen::Pause),
            start_time: Some(42),
            current_cycle: Some(2),
            ..SessionPatch::default()
        }
        .into_record();

        assert_eq!(record.len(), 3);
        assert_eq!(record.get("screen"), Some(&json!("pause")));
        assert_eq!(record.get("startTime"), Some(&json!(42)));
        assert_eq!(record.get("currentCycle"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn load_tolerates_missing_and_corrupt_values() {
        let mut record = Record::new();
        record.insert("screen".into(), json!("not-a-screen"));
        record.insert("studyTimeMinutes".into(), json!(40));
        record.insert("startTime".into(), json!("yesterday"));
        record.insert("durationFocus".into(), Value::Null);
        record.insert("blocked_websites".into(), json!(["a.com"]));
        let store = SessionStore::new(Arc::new(MemoryStore::with_record(record)));

        let stored = store.load().await;
        assert_eq!(stored.screen, None);
        assert_eq!(stored.study_minutes, Some(40));
        assert_eq!(stored.start_time, None);
        assert_eq!(stored.duration_focus, None);
        assert_eq!(stored.blocked_websites, Some(vec!["a.com".to_string()]));

        let settings = stored.settings_or(Settings::default());
        assert_eq!(settings.study_minutes, 40);
        assert_eq!(settings.pause_minutes, 10);
        assert_eq!(settings.cycles, 2);
    }

    #[tokio::test]
    async fn failing_backend_degrades_to_defaults() {
        let store = SessionStore::new(Arc::new(BrokenStore));
        assert_eq!(store.load().await, StoredSession::default());
        store.save(SessionPatch::screen(Screen::Settings)).await;
    }

    #[tokio::test]
    async fn save_then_load_sees_the_patch() {
        let backend = Arc::new(MemoryStore::new());
        let store = SessionStore::new(backend.clone());
        store
            .save(SessionPatch {
                screen: Some(Screen::Focus),
                duration_focus: Some(1500),
                start_time: Some(1_000),
                ..SessionPatch::default()
            })
            .await;
        store
            .save(SessionPatch::blocked_websites(vec!["x.com".into()]))
            .await;

        let stored = store.load().await;
        assert_eq!(stored.screen, Some(Screen::Focus));
        assert_eq!(stored.duration_focus, Some(1500));
        assert_eq!(stored.start_time, Some(1_000));
        assert_eq!(stored.blocked_websites, Some(vec!["x.com".to_string()]));
        assert_eq!(backend.dump().len(), 4);
    }
}
