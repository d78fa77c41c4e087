//! Glue between the background tasks and the dashboard state.
//!
//! Fetch outcomes and command completions arrive over channels and are
//! drained by `pump`, which the UI calls once per frame. Nothing outside
//! `pump` mutates `state`, so all widget updates happen on one thread.

use anyhow::Result;
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Instant};
use tokio::{runtime::Handle, sync::mpsc};
use tracing::{info, warn};

use crate::{
    commands::{Command, CommandCompletion, CommandDispatcher, Submission},
    config::AppConfig,
    dashboard::DashboardState,
    export::{self, ExportDocument, ExportFormat},
    fetcher::Backend,
    logger::AuditLog,
    models::{Channel, HostSample, Severity},
    scheduler::{Admission, PollOutcome, Scheduler},
};

pub struct Console<B: Backend> {
    scheduler: Scheduler<B>,
    dispatcher: CommandDispatcher<B>,
    outcomes: mpsc::UnboundedReceiver<PollOutcome>,
    completions: mpsc::UnboundedReceiver<CommandCompletion>,
    /// Channels still owed a manual-refresh result, keyed by the issued seq.
    refreshing: HashMap<Channel, u64>,
    visible: bool,
    export_dir: String,
    pub state: DashboardState,
}

impl<B: Backend> Console<B> {
    pub fn new(
        backend: Arc<B>,
        runtime: Handle,
        config: &AppConfig,
        audit: Option<AuditLog>,
    ) -> Self {
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let (completion_tx, completions) = mpsc::unbounded_channel();
        Self {
            scheduler: Scheduler::new(
                Arc::clone(&backend),
                runtime.clone(),
                config.polling.clone(),
                outcome_tx,
            ),
            dispatcher: CommandDispatcher::new(backend, runtime, completion_tx, audit),
            outcomes,
            completions,
            refreshing: HashMap::new(),
            visible: false,
            export_dir: config.export_dir.clone(),
            state: DashboardState::new(&config.widgets, config.alerts.clone()),
        }
    }

    pub fn start(&mut self) {
        self.visible = true;
        self.scheduler.start_all();
    }

    /// Hidden windows do not poll; showing the window again restarts every
    /// channel with an immediate fetch.
    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            info!("window restored, resuming polls");
            self.scheduler.start_all();
        } else {
            info!("window hidden, pausing polls");
            self.scheduler.stop_all();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_polling(&self, channel: Channel) -> bool {
        self.scheduler.is_running(channel)
    }

    pub fn refresh_all(&mut self, now: Instant) {
        self.state
            .notify(Severity::Info, None, "Refreshing dashboard...", now);
        for channel in Channel::ALL {
            let seq = self.scheduler.refresh(channel);
            self.refreshing.insert(channel, seq);
        }
    }

    pub fn submit(&mut self, command: Command) -> Submission {
        self.dispatcher.submit(command)
    }

    pub fn pending_confirmation(&self) -> Option<&Command> {
        self.dispatcher.pending()
    }

    pub fn confirm(&mut self) -> bool {
        self.dispatcher.confirm()
    }

    pub fn decline(&mut self) {
        self.dispatcher.decline();
    }

    pub fn record_host(&mut self, sample: HostSample, now: Instant) {
        self.state.set_host_sample(sample, now);
    }

    /// Drains everything that arrived since the last frame. Returns the
    /// number of messages handled.
    pub fn pump(&mut self, now: Instant) -> usize {
        let mut handled = 0;

        while let Ok(outcome) = self.outcomes.try_recv() {
            handled += 1;
            if self.scheduler.admit(&outcome) != Admission::Apply {
                continue;
            }
            let finished_refresh = match self.refreshing.get(&outcome.channel).copied() {
                Some(issued) if outcome.seq >= issued => {
                    self.refreshing.remove(&outcome.channel);
                    self.refreshing.is_empty()
                }
                _ => false,
            };
            self.state.apply(outcome.channel, outcome.result, now);
            if finished_refresh {
                self.state
                    .notify(Severity::Success, None, "Dashboard refreshed", now);
            }
        }

        while let Ok(done) = self.completions.try_recv() {
            handled += 1;
            self.complete(done, now);
        }

        handled
    }

    fn complete(&mut self, done: CommandCompletion, now: Instant) {
        let description = done.command.describe();
        match &done.result {
            Ok(_) if done.confirmed_reset() => {
                self.state
                    .notify(Severity::Success, None, "Statistics reset", now);
            }
            Ok(reply) => match &done.command {
                Command::DownloadLog { kind } => {
                    match export::save_download(&self.export_dir, *kind, &reply.body) {
                        Ok(path) => self.state.notify(
                            Severity::Success,
                            None,
                            format!("Log saved to {}", path.display()),
                            now,
                        ),
                        Err(e) => {
                            warn!("saving downloaded log failed: {e:#}");
                            self.state.notify(
                                Severity::Danger,
                                None,
                                format!("Could not save log: {e}"),
                                now,
                            )
                        }
                    };
                }
                _ => {
                    self.state
                        .notify(Severity::Success, None, format!("Done: {description}"), now);
                }
            },
            Err(e) => {
                warn!(action = %description, "command failed: {e}");
                self.state.notify(
                    Severity::Danger,
                    None,
                    format!("Could not {description}: {e}"),
                    now,
                );
            }
        }

        // success or not, the server state may have moved
        for channel in done.command.affected_channels() {
            let _ = self.scheduler.refresh(channel);
        }
    }

    /// Per-frame housekeeping; true while an animation is running.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.state.tick(now)
    }

    pub fn export(&mut self, format: ExportFormat, now: Instant) -> Result<PathBuf> {
        let doc = ExportDocument::capture(&self.state, format);
        let path = export::write_export(&self.export_dir, &doc)?;
        info!(path = %path.display(), "dashboard exported");
        self.state
            .notify(Severity::Success, None, "Data export completed", now);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::LogKind, models::StatsSnapshot, scheduler::tests::FakeBackend,
    };
    use std::time::Duration;
    use tokio::time::sleep;

    fn console(
        delay: Duration,
    ) -> (Console<FakeBackend>, Arc<FakeBackend>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            export_dir: dir.path().to_str().unwrap().to_string(),
            ..AppConfig::default()
        };
        let backend = Arc::new(FakeBackend::new(delay));
        *backend.stats.lock().unwrap() = StatsSnapshot {
            attacks: 42,
            ..Default::default()
        };
        let console = Console::new(Arc::clone(&backend), Handle::current(), &config, None);
        (console, backend, dir)
    }

    #[tokio::test(start_paused = true)]
    async fn visible_console_applies_polls() {
        let (mut console, _backend, _dir) = console(Duration::from_millis(100));
        console.start();
        sleep(Duration::from_millis(200)).await;

        assert!(console.pump(Instant::now()) >= 5);
        assert_eq!(console.state.stats.as_ref().map(|s| s.attacks), Some(42));
        assert_eq!(console.state.users, vec!["alice".to_string()]);
        assert_eq!(console.state.access.blocked, vec!["mallory".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_resolving_after_stop_does_not_update_widgets() {
        let (mut console, _backend, _dir) = console(Duration::from_millis(800));
        console.start();
        sleep(Duration::from_millis(5)).await;
        console.set_visible(false);
        assert!(!console.is_polling(Channel::Stats));

        sleep(Duration::from_secs(1)).await;
        assert_eq!(console.pump(Instant::now()), 5);
        assert!(console.state.stats.is_none());
        assert_eq!(console.state.counters.attacks.target(), 0.0);
        assert!(console.state.users.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restoring_window_restarts_polling() {
        let (mut console, backend, _dir) = console(Duration::ZERO);
        console.start();
        sleep(Duration::from_millis(5)).await;
        console.set_visible(false);
        sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.fetch_count(Channel::Stats), 1);

        console.set_visible(true);
        sleep(Duration::from_millis(5)).await;
        assert_eq!(backend.fetch_count(Channel::Stats), 2);
        console.pump(Instant::now());
        assert!(console.state.stats.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn declined_confirmation_sends_nothing() {
        let (mut console, backend, _dir) = console(Duration::ZERO);
        assert_eq!(
            console.submit(Command::ResetStats),
            Submission::AwaitingConfirmation
        );
        assert_eq!(console.pending_confirmation(), Some(&Command::ResetStats));
        console.decline();
        assert!(console.pending_confirmation().is_none());
        assert!(!console.confirm());

        sleep(Duration::from_millis(50)).await;
        assert!(backend.executed.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_reset_notifies_and_refetches() {
        let (mut console, backend, _dir) = console(Duration::ZERO);
        console.start();
        sleep(Duration::from_millis(10)).await;
        console.pump(Instant::now());
        let stats_before = backend.fetch_count(Channel::Stats);
        let lists_before = backend.fetch_count(Channel::AccessLists);
        let users_before = backend.fetch_count(Channel::Users);

        console.submit(Command::ResetStats);
        assert!(console.confirm());
        sleep(Duration::from_millis(10)).await;
        console.pump(Instant::now());
        sleep(Duration::from_millis(10)).await;
        console.pump(Instant::now());

        assert_eq!(*backend.executed.lock().unwrap(), vec![Command::ResetStats]);
        assert_eq!(console.state.notifications.search("Statistics reset").len(), 1);
        assert_eq!(backend.fetch_count(Channel::Stats), stats_before + 1);
        assert_eq!(backend.fetch_count(Channel::AccessLists), lists_before + 1);
        assert_eq!(backend.fetch_count(Channel::Users), users_before);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_command_raises_danger_and_refetches() {
        let (mut console, backend, _dir) = console(Duration::ZERO);
        *backend.fail_commands.lock().unwrap() = true;
        console.start();
        sleep(Duration::from_millis(10)).await;
        console.pump(Instant::now());
        let lists_before = backend.fetch_count(Channel::AccessLists);
        let stats_before = backend.fetch_count(Channel::Stats);

        console.submit(Command::BlockUser {
            user: "mallory".into(),
        });
        sleep(Duration::from_millis(10)).await;
        console.pump(Instant::now());

        let latest = console.state.notifications.latest().unwrap();
        assert_eq!(latest.severity, Severity::Danger);
        assert!(latest.message.starts_with("Could not block mallory"));

        sleep(Duration::from_millis(10)).await;
        console.pump(Instant::now());
        assert_eq!(backend.fetch_count(Channel::AccessLists), lists_before + 1);
        assert_eq!(backend.fetch_count(Channel::Stats), stats_before);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_reports_start_and_end() {
        let (mut console, _backend, _dir) = console(Duration::ZERO);
        console.start();
        sleep(Duration::from_millis(10)).await;
        console.pump(Instant::now());

        console.refresh_all(Instant::now());
        assert_eq!(
            console.state.notifications.latest().map(|n| n.message.as_str()),
            Some("Refreshing dashboard...")
        );
        sleep(Duration::from_millis(10)).await;
        console.pump(Instant::now());
        assert_eq!(
            console.state.notifications.latest().map(|n| n.message.as_str()),
            Some("Dashboard refreshed")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_while_hidden_waits_for_fresh_data() {
        let (mut console, _backend, _dir) = console(Duration::from_millis(100));
        console.start();
        sleep(Duration::from_millis(5)).await;
        console.set_visible(false);
        console.refresh_all(Instant::now());
        sleep(Duration::from_millis(200)).await;

        // the in-flight polls and the refresh all resolve while stopped
        assert_eq!(console.pump(Instant::now()), 10);
        assert!(console.state.notifications.search("Dashboard refreshed").is_empty());

        console.set_visible(true);
        sleep(Duration::from_millis(200)).await;
        console.pump(Instant::now());
        assert_eq!(console.state.notifications.search("Dashboard refreshed").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_failures_mark_channel_stale() {
        let (mut console, backend, _dir) = console(Duration::ZERO);
        *backend.fail.lock().unwrap() = true;
        console.start();
        // stats ticks at 0, 1500 and 3000 ms; mail log only at 0 and 2500
        sleep(Duration::from_millis(3010)).await;
        console.pump(Instant::now());
        assert!(console.state.is_stale(Channel::Stats));
        assert!(!console.state.is_stale(Channel::MailLog));

        *backend.fail.lock().unwrap() = false;
        sleep(Duration::from_millis(1500)).await;
        console.pump(Instant::now());
        assert!(!console.state.is_stale(Channel::Stats));
    }

    #[tokio::test(start_paused = true)]
    async fn downloaded_log_lands_in_export_dir() {
        let (mut console, _backend, dir) = console(Duration::ZERO);
        console.submit(Command::DownloadLog {
            kind: LogKind::Defense,
        });
        sleep(Duration::from_millis(10)).await;
        console.pump(Instant::now());

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("defense-log-"));
    }

    #[tokio::test(start_paused = true)]
    async fn export_writes_file_and_notifies() {
        let (mut console, _backend, _dir) = console(Duration::ZERO);
        let path = console.export(ExportFormat::Json, Instant::now()).unwrap();
        assert!(path.exists());
        assert_eq!(
            console.state.notifications.latest().map(|n| n.message.as_str()),
            Some("Data export completed")
        );
    }
}
