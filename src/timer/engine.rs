use std::time::Duration;

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time,
};

use crate::{log_debug, log_info};

use super::{CountdownEvent, CountdownSnapshot, PhaseMode};

const ENABLE_LOGS: bool = true;

/// Owns the one active countdown ticker.
///
/// The engine knows nothing about screens or blocking: a duration goes in,
/// tick and end events come out on the channel handed back by [`CountdownEngine::new`].
pub struct CountdownEngine {
    events: UnboundedSender<CountdownEvent>,
    ticker: Option<JoinHandle<()>>,
    tick_interval: Duration,
    generation: u64,
    mode: Option<PhaseMode>,
}

impl CountdownEngine {
    pub fn new(tick_interval: Duration) -> (Self, UnboundedReceiver<CountdownEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let engine = Self {
            events,
            ticker: None,
            tick_interval,
            generation: 0,
            mode: None,
        };
        (engine, receiver)
    }

    /// Start counting down from `initial_seconds`, replacing any running
    /// countdown. Emits the initial value immediately, then one tick per
    /// interval down to zero, then `End` on the following tick.
    pub fn start(&mut self, initial_seconds: u64, mode: PhaseMode) -> u64 {
        self.cancel_ticker();

        self.generation = self.generation.wrapping_add(1);
        self.mode = Some(mode);
        let generation = self.generation;

        let _ = self
            .events
            .send(CountdownEvent::tick(generation, mode, initial_seconds));

        let events = self.events.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + tick_interval, tick_interval);
            let mut remaining = initial_seconds as i64;
            loop {
                interval.tick().await;
                remaining -= 1;

                if remaining < 0 {
                    let _ = events.send(CountdownEvent::end(generation, mode));
                    break;
                }

                if events
                    .send(CountdownEvent::tick(generation, mode, remaining as u64))
                    .is_err()
                {
                    break;
                }
            }
        });

        self.ticker = Some(handle);
        log_info!(
            "Countdown started: mode={} seconds={} generation={}",
            mode.as_str(),
            initial_seconds,
            generation
        );
        generation
    }

    /// Cancel the active countdown, if any. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.cancel_ticker() {
            log_info!("Countdown stopped: generation={}", self.generation);
        }
        // Anything still queued from the aborted run is now stale.
        self.generation = self.generation.wrapping_add(1);
        self.mode = None;
    }

    /// Whether `event` came from the current run.
    pub fn is_current(&self, event: &CountdownEvent) -> bool {
        event.generation == self.generation && self.mode == Some(event.mode)
    }

    /// Mark the current run complete after its `End` event was handled.
    pub fn finish(&mut self, generation: u64) {
        if generation == self.generation {
            self.ticker = None;
            self.mode = None;
            log_debug!("Countdown finished: generation={}", generation);
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn mode(&self) -> Option<PhaseMode> {
        self.mode
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        CountdownSnapshot {
            running: self.is_running(),
            mode: self.mode,
            generation: self.generation,
        }
    }

    fn cancel_ticker(&mut self) -> bool {
        match self.ticker.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for CountdownEngine {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}
