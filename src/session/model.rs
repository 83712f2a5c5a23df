use serde::{Deserialize, Serialize};

use crate::{blocking::DomainList, timer::PhaseMode};

pub const DEFAULT_STUDY_MINUTES: u32 = 25;
pub const DEFAULT_PAUSE_MINUTES: u32 = 10;
pub const DEFAULT_CYCLES: u32 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    #[default]
    Welcome,
    Settings,
    Focus,
    Pause,
    Blocking,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Welcome => "welcome",
            Screen::Settings => "settings",
            Screen::Focus => "focus",
            Screen::Pause => "pause",
            Screen::Blocking => "blocking",
        }
    }

    /// The timed phase this screen shows, if any.
    pub fn phase(&self) -> Option<PhaseMode> {
        match self {
            Screen::Focus => Some(PhaseMode::Focus),
            Screen::Pause => Some(PhaseMode::Pause),
            _ => None,
        }
    }
}

impl From<PhaseMode> for Screen {
    fn from(mode: PhaseMode) -> Self {
        match mode {
            PhaseMode::Focus => Screen::Focus,
            PhaseMode::Pause => Screen::Pause,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    StudyMinutes,
    PauseMinutes,
    Cycles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Increase,
    Decrease,
}

/// User-configured durations and cycle count, all at least 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub study_minutes: u32,
    pub pause_minutes: u32,
    pub cycles: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            study_minutes: DEFAULT_STUDY_MINUTES,
            pause_minutes: DEFAULT_PAUSE_MINUTES,
            cycles: DEFAULT_CYCLES,
        }
    }
}

impl Settings {
    pub fn get(&self, field: SettingField) -> u32 {
        match field {
            SettingField::StudyMinutes => self.study_minutes,
            SettingField::PauseMinutes => self.pause_minutes,
            SettingField::Cycles => self.cycles,
        }
    }

    /// Apply one step to `field`. Decrementing below 1 is a no-op, not an
    /// error. Returns the new value when it changed.
    pub fn adjust(&mut self, field: SettingField, step: Step) -> Option<u32> {
        let slot = match field {
            SettingField::StudyMinutes => &mut self.study_minutes,
            SettingField::PauseMinutes => &mut self.pause_minutes,
            SettingField::Cycles => &mut self.cycles,
        };

        match step {
            Step::Increase => {
                *slot = slot.saturating_add(1);
                Some(*slot)
            }
            Step::Decrease if *slot > 1 => {
                *slot -= 1;
                Some(*slot)
            }
            Step::Decrease => None,
        }
    }

    /// Raise any zero value to the minimum of 1.
    pub fn clamped(self) -> Self {
        Self {
            study_minutes: self.study_minutes.max(1),
            pause_minutes: self.pause_minutes.max(1),
            cycles: self.cycles.max(1),
        }
    }
}

/// In-memory view of the popup session. The [`SessionMachine`](super::SessionMachine)
/// is its only writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub screen: Screen,
    pub settings: Settings,
    pub current_cycle: u32,
    pub total_cycles: u32,
    /// Frozen at session start so settings edits don't touch a running cycle.
    pub duration_focus_secs: u64,
    pub duration_pause_secs: u64,
    /// Epoch milliseconds at which the current phase began.
    pub start_time_ms: Option<i64>,
    pub active_phase: Option<PhaseMode>,
    pub blocked_domains: DomainList,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        let settings = settings.clamped();
        Self {
            screen: Screen::Welcome,
            settings,
            current_cycle: 1,
            total_cycles: settings.cycles,
            duration_focus_secs: u64::from(settings.study_minutes) * 60,
            duration_pause_secs: u64::from(settings.pause_minutes) * 60,
            start_time_ms: None,
            active_phase: None,
            blocked_domains: DomainList::default(),
        }
    }

    pub fn duration_for(&self, mode: PhaseMode) -> u64 {
        match mode {
            PhaseMode::Focus => self.duration_focus_secs,
            PhaseMode::Pause => self.duration_pause_secs,
        }
    }

    /// Snapshot the current settings into the running-session fields.
    pub fn freeze_settings(&mut self) {
        self.current_cycle = 1;
        self.total_cycles = self.settings.cycles;
        self.duration_focus_secs = u64::from(self.settings.study_minutes) * 60;
        self.duration_pause_secs = u64::from(self.settings.pause_minutes) * 60;
    }

    pub fn is_focus_active(&self) -> bool {
        self.active_phase == Some(PhaseMode::Focus)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
