use serde::{Deserialize, Serialize};

use super::clock::format_hms;

/// Which timed phase a countdown belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PhaseMode {
    Focus,
    Pause,
}

impl PhaseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseMode::Focus => "focus",
            PhaseMode::Pause => "pause",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEventKind {
    /// Remaining seconds to display. Emitted for N, N-1, ..., 0.
    Tick { remaining: u64 },
    /// Emitted one tick after the display showed zero.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownEvent {
    /// Start counter of the engine run that produced the event.
    pub generation: u64,
    pub mode: PhaseMode,
    pub kind: CountdownEventKind,
}

impl CountdownEvent {
    pub fn tick(generation: u64, mode: PhaseMode, remaining: u64) -> Self {
        Self {
            generation,
            mode,
            kind: CountdownEventKind::Tick { remaining },
        }
    }

    pub fn end(generation: u64, mode: PhaseMode) -> Self {
        Self {
            generation,
            mode,
            kind: CountdownEventKind::End,
        }
    }

    pub fn display(&self) -> Option<String> {
        match self.kind {
            CountdownEventKind::Tick { remaining } => Some(format_hms(remaining)),
            CountdownEventKind::End => None,
        }
    }
}

/// Snapshot of the engine, for logging and for the view layer.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CountdownSnapshot {
    pub running: bool,
    pub mode: Option<PhaseMode>,
    pub generation: u64,
}
