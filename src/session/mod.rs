//! Popup session: the screen state machine, its commands and restoration.

mod commands;
mod machine;
mod model;
mod restore;

pub use commands::{AddDomainReply, PopupCommand};
pub use machine::{MachineDeps, SessionMachine};
pub use model::{
    Screen, Session, SettingField, Settings, Step, DEFAULT_CYCLES, DEFAULT_PAUSE_MINUTES,
    DEFAULT_STUDY_MINUTES,
};
pub use restore::{plan_restore, RestorePlan};
