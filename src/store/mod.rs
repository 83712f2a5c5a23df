//! Durable key-value persistence for the popup session.
//!
//! [`KeyValueStore`] mirrors the browser storage contract (`get(keys)`,
//! `set(partial)`); [`SessionStore`] layers the typed session fields on top.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

mod memory;
mod migrations;
mod session_store;
mod sqlite;

pub use memory::MemoryStore;
pub use session_store::{SessionPatch, SessionStore, StoredSession};
pub use sqlite::SqliteStore;

/// A partial record: only the keys present are read or written.
pub type Record = Map<String, Value>;

pub mod keys {
    pub const SCREEN: &str = "screen";
    pub const STUDY_MINUTES: &str = "studyTimeMinutes";
    pub const PAUSE_MINUTES: &str = "pauseTimeMinutes";
    pub const CYCLES: &str = "cycles";
    pub const CURRENT_CYCLE: &str = "currentCycle";
    pub const DURATION_FOCUS: &str = "durationFocus";
    pub const DURATION_PAUSE: &str = "durationPause";
    pub const START_TIME: &str = "startTime";
    pub const BLOCKED_WEBSITES: &str = "blocked_websites";

    pub const ALL: [&str; 9] = [
        SCREEN,
        STUDY_MINUTES,
        PAUSE_MINUTES,
        CYCLES,
        CURRENT_CYCLE,
        DURATION_FOCUS,
        DURATION_PAUSE,
        START_TIME,
        BLOCKED_WEBSITES,
    ];
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the given keys. Absent keys are simply missing from the record.
    async fn get(&self, keys: &[&str]) -> Result<Record>;

    /// Merge `items` into the store, overwriting existing keys.
    async fn set(&self, items: Record) -> Result<()>;
}
