pub mod blocking;
pub mod config;
pub mod session;
pub mod store;
pub mod timer;
pub mod utils;
pub mod view;

use std::{path::Path, sync::Arc};

use anyhow::{anyhow, Context, Result};
use log::warn;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use blocking::{BlockingRules, DomainError, InMemoryRuleSet};
use config::ConfigStore;
use session::{MachineDeps, PopupCommand, Session, SessionMachine};
use store::{KeyValueStore, MemoryStore, SqliteStore};
use timer::SystemClock;
use view::PopupView;

pub use utils::init_logging;

/// Handle to an open popup. Commands are queued to the session loop; the
/// loop stops once the handle is closed or dropped.
pub struct Popup {
    commands: mpsc::UnboundedSender<PopupCommand>,
    task: JoinHandle<SessionMachine>,
}

impl Popup {
    pub fn send(&self, command: PopupCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("session loop has stopped"))
    }

    pub async fn add_domain(&self, input: &str) -> Result<Result<Option<String>, DomainError>> {
        let (reply, answer) = oneshot::channel();
        self.send(PopupCommand::AddDomain {
            input: input.to_string(),
            reply,
        })?;
        answer.await.context("session loop dropped the reply")
    }

    /// Stop the session loop and hand back the final in-memory session. A
    /// running phase stays persisted and resumes on the next open.
    pub async fn close(self) -> Result<Session> {
        drop(self.commands);
        let machine = self.task.await.context("session loop panicked")?;
        Ok(machine.session().clone())
    }
}

/// Open the popup against the data kept in `app_data_dir`: load
/// `config.json`, open the session store, restore any running phase, then
/// start the session loop.
///
/// Without a `blocker` an in-memory rule table is used.
pub async fn open_popup(
    app_data_dir: &Path,
    blocker: Option<Arc<dyn BlockingRules>>,
    view: Arc<dyn PopupView>,
) -> Result<Popup> {
    init_logging();
    log::info!("FocusUp popup opening...");

    std::fs::create_dir_all(app_data_dir).with_context(|| {
        format!("failed to create app data dir {}", app_data_dir.display())
    })?;

    let config = ConfigStore::new(app_data_dir.join("config.json"))?.get();

    let store: Arc<dyn KeyValueStore> =
        match SqliteStore::new(app_data_dir.join("focusup.sqlite3")) {
            Ok(store) => Arc::new(store),
            Err(err) => {
                warn!("Session store unavailable, state will not survive close: {err:#}");
                Arc::new(MemoryStore::new())
            }
        };
    let blocker = blocker.unwrap_or_else(|| Arc::new(InMemoryRuleSet::new(config.rule_id_start)));

    let deps = MachineDeps {
        store,
        blocker,
        view,
        clock: Arc::new(SystemClock),
    };
    let mut machine = SessionMachine::new(deps, &config);
    machine.restore().await;

    let (commands, receiver) = mpsc::unbounded_channel();
    let task = tokio::spawn(machine.run(receiver));
    Ok(Popup { commands, task })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        session::Screen,
        view::{HeadlessView, RecordingView},
    };
    use std::{
        path::PathBuf,
        sync::atomic::{AtomicUsize, Ordering},
    };

    static NEXT_TEMP_DIR: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: PathBuf,
    }

    impl TempDir {
        fn new() -> Self {
            let sequence = NEXT_TEMP_DIR.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "focusup-popup-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            Self { path }
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    #[tokio::test]
    async fn state_survives_popup_reopen() {
        let dir = TempDir::new();

        let popup = open_popup(&dir.path, None, Arc::new(HeadlessView))
            .await
            .expect("open popup");
        popup.send(PopupCommand::Begin).expect("begin");
        assert_eq!(
            popup.add_domain("news.example.org").await.expect("reply"),
            Ok(Some("news.example.org".to_string()))
        );
        let closed = popup.close().await.expect("close");
        assert_eq!(closed.screen, Screen::Settings);

        let view = Arc::new(RecordingView::default());
        let popup = open_popup(&dir.path, None, view.clone())
            .await
            .expect("reopen popup");
        let session = popup.close().await.expect("close");

        assert_eq!(session.screen, Screen::Settings);
        assert_eq!(
            session.blocked_domains.as_slice(),
            &["news.example.org".to_string()]
        );
        assert_eq!(view.last_screen(), Some(Screen::Settings));
        assert!(dir.path.join("focusup.sqlite3").exists());
    }
}
