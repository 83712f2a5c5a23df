use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    blocking::{BlockingRules, DomainError},
    config::AppConfig,
    log_debug, log_error, log_info, log_warn,
    store::{KeyValueStore, SessionPatch, SessionStore},
    timer::{Clock, CountdownEngine, CountdownEvent, CountdownEventKind, CountdownSnapshot, PhaseMode},
    view::{PopupView, TimerSlot},
};

use super::{Screen, Session, SettingField, Settings, Step};

const ENABLE_LOGS: bool = true;

/// Collaborators the machine talks to.
#[derive(Clone)]
pub struct MachineDeps {
    pub store: Arc<dyn KeyValueStore>,
    pub blocker: Arc<dyn BlockingRules>,
    pub view: Arc<dyn PopupView>,
    pub clock: Arc<dyn Clock>,
}

/// Owns the session and the countdown engine. Every user action and every
/// countdown event goes through here; it is the only writer of [`Session`].
pub struct SessionMachine {
    pub(super) session: Session,
    pub(super) engine: CountdownEngine,
    pub(super) events: Option<UnboundedReceiver<CountdownEvent>>,
    pub(super) store: SessionStore,
    pub(super) blocker: Arc<dyn BlockingRules>,
    pub(super) view: Arc<dyn PopupView>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) defaults: Settings,
}

impl SessionMachine {
    pub fn new(deps: MachineDeps, config: &AppConfig) -> Self {
        let (engine, events) = CountdownEngine::new(config.tick_interval());
        let defaults = config.session_defaults.clamped();

        Self {
            session: Session::new(defaults),
            engine,
            events: Some(events),
            store: SessionStore::new(deps.store),
            blocker: deps.blocker,
            view: deps.view,
            clock: deps.clock,
            defaults,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn countdown(&self) -> CountdownSnapshot {
        self.engine.snapshot()
    }

    /// Welcome -> Settings.
    pub async fn begin(&mut self) {
        if self.session.screen != Screen::Welcome {
            log_warn!("Ignoring begin from {} screen", self.session.screen.as_str());
            return;
        }
        self.show(Screen::Settings).await;
        self.view.render_settings(&self.session.settings);
    }

    /// Settings -> Focus, starting cycle 1 with the current settings frozen.
    pub async fn start_session(&mut self) {
        if self.session.screen != Screen::Settings || self.session.active_phase.is_some() {
            log_warn!("Ignoring start from {} screen", self.session.screen.as_str());
            return;
        }

        self.session.freeze_settings();
        let settings = self.session.settings;
        log_info!(
            "Session started: study={}m pause={}m cycles={}",
            settings.study_minutes,
            settings.pause_minutes,
            settings.cycles
        );

        let patch = SessionPatch {
            study_minutes: Some(settings.study_minutes),
            pause_minutes: Some(settings.pause_minutes),
            cycles: Some(settings.cycles),
            duration_focus: Some(self.session.duration_focus_secs),
            duration_pause: Some(self.session.duration_pause_secs),
            ..SessionPatch::default()
        };
        self.enter_phase(PhaseMode::Focus, patch).await;
    }

    /// End the active phase now, exactly as if its countdown had run out.
    pub async fn skip(&mut self) {
        let Some(phase) = self.session.active_phase else {
            log_warn!("Ignoring skip with no active phase");
            return;
        };
        log_info!("Skipping {} phase", phase.as_str());
        self.engine.stop();
        self.finish_phase(phase).await;
    }

    /// Abandon the running session and return to Settings.
    pub async fn back_to_settings(&mut self) {
        self.stop_countdown().await;
        self.show(Screen::Settings).await;
        self.view.render_settings(&self.session.settings);
    }

    /// Show the blocked-domain editor. A running countdown keeps running.
    pub async fn open_blocking_config(&mut self) {
        self.show(Screen::Blocking).await;
        self.view
            .render_blocked_domains(self.session.blocked_domains.as_slice());
    }

    /// Step one setting. Only the Settings screen edits; a running session
    /// keeps the values it froze at start.
    pub async fn adjust(&mut self, field: SettingField, step: Step) {
        if self.session.screen != Screen::Settings || self.session.active_phase.is_some() {
            log_warn!("Ignoring adjust on {} screen", self.session.screen.as_str());
            return;
        }
        let Some(value) = self.session.settings.adjust(field, step) else {
            return;
        };

        let patch = match field {
            SettingField::StudyMinutes => SessionPatch {
                study_minutes: Some(value),
                ..SessionPatch::default()
            },
            SettingField::PauseMinutes => SessionPatch {
                pause_minutes: Some(value),
                ..SessionPatch::default()
            },
            SettingField::Cycles => SessionPatch {
                cycles: Some(value),
                ..SessionPatch::default()
            },
        };
        self.store.save(patch).await;
        self.view.render_settings(&self.session.settings);
    }

    /// Validate and append a domain. Rejections leave everything untouched.
    pub async fn add_domain(&mut self, input: &str) -> Result<Option<String>, DomainError> {
        let added = self.session.blocked_domains.add(input)?;
        let Some(domain) = added else {
            return Ok(None);
        };

        log_info!("Blocked domain added: {}", domain);
        let domains = self.session.blocked_domains.to_vec();
        self.store
            .save(SessionPatch::blocked_websites(domains.clone()))
            .await;
        self.view.render_blocked_domains(&domains);

        if self.session.is_focus_active() {
            self.apply_blocking(&domains, true).await;
        }
        Ok(Some(domain))
    }

    pub async fn remove_domain(&mut self, index: usize) -> Option<String> {
        let previous = self.session.blocked_domains.to_vec();
        let removed = self.session.blocked_domains.remove_at(index)?;

        log_info!("Blocked domain removed: {}", removed);
        let domains = self.session.blocked_domains.to_vec();
        self.store
            .save(SessionPatch::blocked_websites(domains.clone()))
            .await;
        self.view.render_blocked_domains(&domains);

        if self.session.is_focus_active() {
            // Ids are positional, so the old set must go before the new one is installed.
            self.apply_blocking(&previous, false).await;
            self.apply_blocking(&domains, true).await;
        }
        Some(removed)
    }

    /// Wait for the next countdown event and handle it. Returns `false`
    /// once the engine channel is gone.
    pub async fn pump(&mut self) -> bool {
        let event = match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        };
        match event {
            Some(event) => {
                self.handle_event(event).await;
                true
            }
            None => false,
        }
    }

    pub async fn handle_event(&mut self, event: CountdownEvent) {
        if !self.engine.is_current(&event) {
            log_debug!("Dropping stale countdown event: {:?}", event);
            return;
        }

        match event.kind {
            CountdownEventKind::Tick { remaining } => {
                let text = crate::timer::format_hms(remaining);
                self.view.update_timer(TimerSlot::from(event.mode), &text);
            }
            CountdownEventKind::End => {
                self.engine.finish(event.generation);
                log_info!("{} countdown ended", event.mode.as_str());
                self.finish_phase(event.mode).await;
            }
        }
    }

    /// The single end-of-phase transition, shared by natural expiry, skip
    /// and restoration of an expired phase.
    pub(super) async fn finish_phase(&mut self, ending: PhaseMode) {
        if ending == PhaseMode::Focus {
            self.exit_focus().await;
        }

        match ending {
            PhaseMode::Focus => {
                self.enter_phase(PhaseMode::Pause, SessionPatch::default())
                    .await;
            }
            PhaseMode::Pause if self.session.current_cycle < self.session.total_cycles => {
                self.session.current_cycle += 1;
                self.enter_phase(PhaseMode::Focus, SessionPatch::default())
                    .await;
            }
            PhaseMode::Pause => self.end_session().await,
        }
    }

    /// Make `mode` the active phase: persist, show, run hooks, start the engine.
    async fn enter_phase(&mut self, mode: PhaseMode, patch: SessionPatch) {
        let now = self.clock.now_ms();
        let screen = Screen::from(mode);

        self.session.active_phase = Some(mode);
        self.session.start_time_ms = Some(now);
        self.session.screen = screen;

        self.store
            .save(SessionPatch {
                screen: Some(screen),
                start_time: Some(now),
                current_cycle: Some(self.session.current_cycle),
                ..patch
            })
            .await;
        self.view.show_screen(screen);

        log_info!(
            "Entering {} phase: cycle {}/{}",
            mode.as_str(),
            self.session.current_cycle,
            self.session.total_cycles
        );
        self.resume_phase(mode, self.session.duration_for(mode)).await;
    }

    /// Run the enter hook for `mode` and count down `seconds`. Also used by
    /// restoration, where the phase is already persisted.
    pub(super) async fn resume_phase(&mut self, mode: PhaseMode, seconds: u64) {
        if mode == PhaseMode::Focus {
            let domains = self.session.blocked_domains.to_vec();
            self.apply_blocking(&domains, true).await;
        }
        self.engine.start(seconds, mode);
    }

    async fn end_session(&mut self) {
        log_info!(
            "Session complete after {} cycle(s)",
            self.session.total_cycles
        );
        self.session.active_phase = None;
        self.session.start_time_ms = None;
        self.show(Screen::Welcome).await;
    }

    /// Cancel the countdown and lift blocking.
    async fn stop_countdown(&mut self) {
        self.engine.stop();
        self.session.active_phase = None;
        self.session.start_time_ms = None;
        self.exit_focus().await;
    }

    async fn exit_focus(&mut self) {
        let domains = self.session.blocked_domains.to_vec();
        self.apply_blocking(&domains, false).await;
    }

    pub(super) async fn apply_blocking(&self, domains: &[String], active: bool) {
        if let Err(err) = self.blocker.apply_blocking_rules(domains, active).await {
            log_error!(
                "Failed to {} blocking rules: {err:#}",
                if active { "apply" } else { "remove" }
            );
        }
    }

    pub(super) async fn show(&mut self, screen: Screen) {
        self.session.screen = screen;
        self.store.save(SessionPatch::screen(screen)).await;
        self.view.show_screen(screen);
    }
}
