use tokio::sync::{mpsc::UnboundedReceiver, oneshot};

use crate::{blocking::DomainError, log_info, log_warn};

use super::{SessionMachine, SettingField, Step};

const ENABLE_LOGS: bool = true;

pub type AddDomainReply = oneshot::Sender<Result<Option<String>, DomainError>>;

/// User actions forwarded from the popup.
#[derive(Debug)]
pub enum PopupCommand {
    Begin,
    StartSession,
    Skip,
    BackToSettings,
    OpenBlockingConfig,
    Adjust { field: SettingField, step: Step },
    /// The reply carries the normalized domain, `None` for blank input, or
    /// the validation error to show next to the form.
    AddDomain { input: String, reply: AddDomainReply },
    RemoveDomain { index: usize },
}

impl SessionMachine {
    pub async fn dispatch(&mut self, command: PopupCommand) {
        match command {
            PopupCommand::Begin => self.begin().await,
            PopupCommand::StartSession => self.start_session().await,
            PopupCommand::Skip => self.skip().await,
            PopupCommand::BackToSettings => self.back_to_settings().await,
            PopupCommand::OpenBlockingConfig => self.open_blocking_config().await,
            PopupCommand::Adjust { field, step } => self.adjust(field, step).await,
            PopupCommand::AddDomain { input, reply } => {
                let result = self.add_domain(&input).await;
                if let Err(err) = &result {
                    log_warn!("Rejected domain '{}': {}", input.trim(), err);
                }
                let _ = reply.send(result);
            }
            PopupCommand::RemoveDomain { index } => {
                if self.remove_domain(index).await.is_none() {
                    log_warn!("No blocked domain at index {}", index);
                }
            }
        }
    }

    /// Drive the machine until the command channel closes, interleaving
    /// popup commands with countdown events. Returns the machine so the
    /// caller can inspect or drop it.
    pub async fn run(mut self, mut commands: UnboundedReceiver<PopupCommand>) -> Self {
        let Some(mut events) = self.events.take() else {
            log_warn!("Session loop already ran; ignoring");
            return self;
        };

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.dispatch(command).await,
                    None => {
                        log_info!("Popup closed; session loop stopping");
                        break;
                    }
                },
                Some(event) = events.recv() => self.handle_event(event).await,
            }
        }

        self.events = Some(events);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        session::{machine::tests::Harness, Screen},
        timer::PhaseMode,
        view::TimerSlot,
    };
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn add_domain_replies_with_result() {
        let mut harness = Harness::new();

        let (reply, answer) = oneshot::channel();
        harness
            .machine
            .dispatch(PopupCommand::AddDomain {
                input: "https://www.Example.com/path".to_string(),
                reply,
            })
            .await;
        assert_eq!(answer.await.expect("reply"), Ok(Some("example.com".to_string())));

        let (reply, answer) = oneshot::channel();
        harness
            .machine
            .dispatch(PopupCommand::AddDomain {
                input: "example.com".to_string(),
                reply,
            })
            .await;
        assert_eq!(
            answer.await.expect("reply"),
            Err(DomainError::AlreadyBlocked("example.com".to_string()))
        );

        harness
            .machine
            .dispatch(PopupCommand::RemoveDomain { index: 4 })
            .await;
        assert_eq!(harness.machine.session().blocked_domains.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_interleaves_commands_and_ticks() {
        let harness = Harness::new();
        let view = harness.view.clone();
        let (commands, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(harness.machine.run(receiver));

        commands.send(PopupCommand::Begin).expect("send begin");
        commands
            .send(PopupCommand::Adjust {
                field: SettingField::StudyMinutes,
                step: Step::Decrease,
            })
            .expect("send adjust");
        commands.send(PopupCommand::StartSession).expect("send start");

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        commands.send(PopupCommand::Skip).expect("send skip");
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(commands);

        let machine = task.await.expect("session loop");
        assert_eq!(machine.session().screen, Screen::Pause);
        assert_eq!(machine.session().duration_focus_secs, 24 * 60);
        assert_eq!(machine.countdown().mode, Some(PhaseMode::Pause));

        let focus = view.timer_updates(TimerSlot::Focus);
        assert_eq!(
            focus,
            vec!["00:24:00", "00:23:59", "00:23:58", "00:23:57"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
        assert_eq!(
            view.timer_updates(TimerSlot::Pause).first().map(String::as_str),
            Some("00:10:00")
        );
    }
}
