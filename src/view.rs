use std::sync::Mutex;

use crate::{
    session::{Screen, Settings},
    timer::PhaseMode,
};

/// Which of the two countdown displays a string is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSlot {
    Focus,
    Pause,
}

impl From<PhaseMode> for TimerSlot {
    fn from(mode: PhaseMode) -> Self {
        match mode {
            PhaseMode::Focus => TimerSlot::Focus,
            PhaseMode::Pause => TimerSlot::Pause,
        }
    }
}

/// Rendering surface of the popup. Implementations only draw; they never
/// call back into the session.
pub trait PopupView: Send + Sync {
    fn show_screen(&self, screen: Screen);
    fn update_timer(&self, slot: TimerSlot, text: &str);
    fn render_settings(&self, settings: &Settings);
    fn render_blocked_domains(&self, domains: &[String]);
}

/// View that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessView;

impl PopupView for HeadlessView {
    fn show_screen(&self, _screen: Screen) {}
    fn update_timer(&self, _slot: TimerSlot, _text: &str) {}
    fn render_settings(&self, _settings: &Settings) {}
    fn render_blocked_domains(&self, _domains: &[String]) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    Screen(Screen),
    Timer(TimerSlot, String),
    Settings(Settings),
    Domains(Vec<String>),
}

/// View that remembers every call, for assertions.
#[derive(Debug, Default)]
pub struct RecordingView {
    calls: Mutex<Vec<ViewCall>>,
}

impl RecordingView {
    pub fn calls(&self) -> Vec<ViewCall> {
        match self.calls.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn timer_updates(&self, slot: TimerSlot) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ViewCall::Timer(written, text) if written == slot => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_screen(&self) -> Option<Screen> {
        self.calls().into_iter().rev().find_map(|call| match call {
            ViewCall::Screen(screen) => Some(screen),
            _ => None,
        })
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.calls.lock() {
            guard.clear();
        }
    }

    fn push(&self, call: ViewCall) {
        if let Ok(mut guard) = self.calls.lock() {
            guard.push(call);
        }
    }
}

impl PopupView for RecordingView {
    fn show_screen(&self, screen: Screen) {
        self.push(ViewCall::Screen(screen));
    }

    fn update_timer(&self, slot: TimerSlot, text: &str) {
        self.push(ViewCall::Timer(slot, text.to_string()));
    }

    fn render_settings(&self, settings: &Settings) {
        self.push(ViewCall::Settings(*settings));
    }

    fn render_blocked_domains(&self, domains: &[String]) {
        self.push(ViewCall::Domains(domains.to_vec()));
    }
}
