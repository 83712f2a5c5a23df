use crate::{
    blocking::DomainList,
    log_info, log_warn,
    store::StoredSession,
    timer::{elapsed_seconds, format_hms, PhaseMode},
    view::TimerSlot,
};

use super::SessionMachine;

const ENABLE_LOGS: bool = true;

/// What to do with a persisted phase on popup open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePlan {
    /// Nothing to resume.
    Idle,
    Resume { mode: PhaseMode, remaining: u64 },
    /// The phase ran out while the popup was closed.
    Expired { mode: PhaseMode },
}

/// Decide how to pick up a persisted phase at `now_ms`.
///
/// A start time in the future counts as zero elapsed.
pub fn plan_restore(stored: &StoredSession, now_ms: i64) -> RestorePlan {
    let Some(mode) = stored.screen.and_then(|screen| screen.phase()) else {
        return RestorePlan::Idle;
    };
    // Minutes are clamped at 1, so a zero duration only comes from a corrupt record.
    let duration = match mode {
        PhaseMode::Focus => stored.duration_focus,
        PhaseMode::Pause => stored.duration_pause,
    }
    .filter(|seconds| *seconds > 0);
    let (Some(start_time), Some(duration)) = (stored.start_time, duration) else {
        return RestorePlan::Idle;
    };

    let elapsed = elapsed_seconds(now_ms, start_time).max(0);
    let remaining = i64::try_from(duration).unwrap_or(i64::MAX) - elapsed;
    if remaining > 0 {
        RestorePlan::Resume {
            mode,
            remaining: remaining as u64,
        }
    } else {
        RestorePlan::Expired { mode }
    }
}

impl SessionMachine {
    /// Rebuild the session from storage and pick up any running phase.
    pub async fn restore(&mut self) -> RestorePlan {
        let stored = self.store.load().await;
        let settings = stored.settings_or(self.defaults);

        self.session.settings = settings;
        self.session.total_cycles = settings.cycles;
        self.session.current_cycle = stored.current_cycle.unwrap_or(1).clamp(1, settings.cycles);
        self.session.duration_focus_secs = stored
            .duration_focus
            .filter(|seconds| *seconds > 0)
            .unwrap_or(u64::from(settings.study_minutes) * 60);
        self.session.duration_pause_secs = stored
            .duration_pause
            .filter(|seconds| *seconds > 0)
            .unwrap_or(u64::from(settings.pause_minutes) * 60);
        self.session.blocked_domains =
            DomainList::from_stored(stored.blocked_websites.clone().unwrap_or_default());

        let screen = stored.screen.unwrap_or_default();
        self.session.screen = screen;
        self.view.show_screen(screen);
        self.view.render_settings(&self.session.settings);
        self.view
            .render_blocked_domains(self.session.blocked_domains.as_slice());

        let plan = plan_restore(&stored, self.clock.now_ms());
        log_info!("Restoring {} screen: {:?}", screen.as_str(), plan);

        if !matches!(plan, RestorePlan::Resume { mode: PhaseMode::Focus, .. }) {
            // Rules may outlive a popup that closed mid-focus.
            let domains = self.session.blocked_domains.to_vec();
            self.apply_blocking(&domains, false).await;
        }

        match plan {
            RestorePlan::Idle => {
                if screen.phase().is_some() {
                    log_warn!("Persisted {} phase is incomplete; not resuming", screen.as_str());
                }
            }
            RestorePlan::Resume { mode, remaining } => {
                self.session.active_phase = Some(mode);
                self.session.start_time_ms = stored.start_time;
                self.resume_phase(mode, remaining).await;
            }
            RestorePlan::Expired { mode } => {
                let zero = format_hms(0);
                self.view.update_timer(TimerSlot::Focus, &zero);
                self.view.update_timer(TimerSlot::Pause, &zero);
                self.session.active_phase = Some(mode);
                self.session.start_time_ms = stored.start_time;
                self.finish_phase(mode).await;
            }
        }
        plan
    }
}
