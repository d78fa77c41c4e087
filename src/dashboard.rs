//! Everything the console draws, owned in one place and mutated only from
//! the UI thread.

use chrono::{DateTime, Local};
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tracing::debug;

use crate::{
    aggregator::{self, DerivedSeries},
    alerts,
    config::{AlertThresholds, WidgetConfig},
    error::FetchError,
    filters::FilterState,
    models::{
        AttackStatus, Channel, ChannelSnapshot, HostSample, MailEntry, NotificationRecord,
        Severity, StatsSnapshot,
    },
    widgets::{
        ChartKind, ChartSeries, ChartSlot, EventRow, NotificationFeed, ProgressBar, StatField,
        StatusBadge, Table, Widget,
    },
};

/// Consecutive-failure bookkeeping for one channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelHealth {
    pub failures: u32,
    pub last_error: Option<String>,
    pub last_update: Option<DateTime<Local>>,
}

/// Animated headline counters.
#[derive(Debug, Clone)]
pub struct Counters {
    pub attacks: StatField,
    pub success: StatField,
    pub fail: StatField,
    pub blocked: StatField,
    pub emails_sent: StatField,
    pub total_last_hour: StatField,
}

impl Counters {
    fn new(animation: Duration) -> Self {
        Self {
            attacks: StatField::new(animation),
            success: StatField::new(animation),
            fail: StatField::new(animation),
            blocked: StatField::new(animation),
            emails_sent: StatField::new(animation),
            total_last_hour: StatField::new(animation),
        }
    }

    /// `(label key, field)` in display order.
    pub fn fields(&self) -> [(&'static str, &StatField); 6] {
        [
            ("attacks", &self.attacks),
            ("success", &self.success),
            ("fail", &self.fail),
            ("blocked", &self.blocked),
            ("emails_sent", &self.emails_sent),
            ("total_last_hour", &self.total_last_hour),
        ]
    }

    fn update(&mut self, snap: &StatsSnapshot, now: Instant) {
        self.attacks.update(&(snap.attacks as f64), now);
        self.success.update(&(snap.success as f64), now);
        self.fail.update(&(snap.fail as f64), now);
        self.blocked.update(&(snap.blocked as f64), now);
        self.emails_sent.update(&(snap.emails_sent as f64), now);
        self.total_last_hour
            .update(&(snap.total_last_hour as f64), now);
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.fields().iter().any(|(_, f)| f.is_animating(now))
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessLists {
    pub blocked: Vec<String>,
    pub whitelist: Vec<String>,
}

pub struct DashboardState {
    stale_after: u32,
    thresholds: AlertThresholds,
    health: HashMap<Channel, ChannelHealth>,
    host: Option<HostSample>,

    pub stats: Option<StatsSnapshot>,
    pub derived: DerivedSeries,
    pub counters: Counters,
    pub cpu: ProgressBar,
    pub memory: ProgressBar,
    pub disk: ProgressBar,
    pub posture: StatusBadge,
    pub hourly_chart: ChartSlot,
    pub sources_chart: ChartSlot,
    pub status_chart: ChartSlot,
    pub events: Table<EventRow>,
    pub mail: Table<MailEntry>,
    pub access: AccessLists,
    pub users: Vec<String>,
    pub passwords: Vec<String>,
    pub notifications: NotificationFeed,
    pub filters: FilterState,
}

impl DashboardState {
    pub fn new(widgets: &WidgetConfig, thresholds: AlertThresholds) -> Self {
        Self {
            stale_after: widgets.stale_after_failures.max(1),
            thresholds,
            health: HashMap::new(),
            host: None,
            stats: None,
            derived: DerivedSeries::default(),
            counters: Counters::new(Duration::from_millis(widgets.stat_animation_ms)),
            cpu: ProgressBar::default(),
            memory: ProgressBar::default(),
            disk: ProgressBar::default(),
            posture: StatusBadge::default(),
            hourly_chart: ChartSlot::new(ChartKind::Line),
            sources_chart: ChartSlot::new(ChartKind::Bars).with_placeholder("No data"),
            status_chart: ChartSlot::new(ChartKind::Breakdown),
            events: Table::default(),
            mail: Table::default(),
            access: AccessLists::default(),
            users: Vec::new(),
            passwords: Vec::new(),
            notifications: NotificationFeed::new(
                widgets.notification_capacity,
                widgets.notification_ttl(),
            ),
            filters: FilterState::default(),
        }
    }

    pub fn health(&self, channel: Channel) -> ChannelHealth {
        self.health.get(&channel).cloned().unwrap_or_default()
    }

    pub fn is_stale(&self, channel: Channel) -> bool {
        self.health
            .get(&channel)
            .is_some_and(|h| h.failures >= self.stale_after)
    }

    pub fn host(&self) -> Option<&HostSample> {
        self.host.as_ref()
    }

    /// Applies an admitted poll outcome. Failures leave every widget as it was.
    pub fn apply(
        &mut self,
        channel: Channel,
        result: Result<ChannelSnapshot, FetchError>,
        now: Instant,
    ) {
        let health = self.health.entry(channel).or_default();
        match result {
            Ok(snapshot) => {
                health.failures = 0;
                health.last_error = None;
                health.last_update = Some(Local::now());
                self.apply_snapshot(snapshot, now);
            }
            Err(e) => {
                health.failures += 1;
                debug!(
                    channel = channel.as_str(),
                    kind = e.kind(),
                    failures = health.failures,
                    "poll failed: {e}"
                );
                health.last_error = Some(e.to_string());
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: ChannelSnapshot, now: Instant) {
        match snapshot {
            ChannelSnapshot::Stats(stats) => self.apply_stats(stats, now),
            ChannelSnapshot::MailLog(entries) => {
                self.mail.update(entries.as_slice(), now);
            }
            ChannelSnapshot::AccessLists { blocked, whitelist } => {
                self.access = AccessLists { blocked, whitelist };
            }
            ChannelSnapshot::Users(users) => self.users = users,
            ChannelSnapshot::Passwords(passwords) => self.passwords = passwords,
        }
    }

    fn apply_stats(&mut self, stats: StatsSnapshot, now: Instant) {
        self.counters.update(&stats, now);

        let derived = aggregator::derive(&stats.recent);
        self.hourly_chart.update(&hourly_series(&derived), now);
        self.sources_chart.update(&sources_series(&derived), now);
        self.status_chart.update(&status_series(&derived), now);
        self.derived = derived;

        let rows: Vec<EventRow> = stats.recent.iter().map(EventRow::from).collect();
        self.events.update(rows.as_slice(), now);

        match stats.security_score {
            Some(score) => self.posture.update(&score, now),
            None => self.posture.clear(),
        };

        let alerts = alerts::evaluate(&stats, self.host.as_ref(), &self.thresholds);
        self.notifications.update(alerts.as_slice(), now);

        self.stats = Some(stats);
        self.refresh_gauges(now);
    }

    /// Records a local host sample; gauges prefer values reported by the lab.
    pub fn set_host_sample(&mut self, sample: HostSample, now: Instant) {
        self.host = Some(sample);
        self.refresh_gauges(now);
    }

    fn refresh_gauges(&mut self, now: Instant) {
        let stats = self.stats.as_ref();
        let host = self.host.as_ref();
        let pick = |reported: Option<f64>, local: Option<f64>| reported.or(local);

        let gauges = [
            (&mut self.cpu, pick(stats.and_then(|s| s.cpu), host.map(|h| h.cpu))),
            (&mut self.memory, pick(stats.and_then(|s| s.memory), host.map(|h| h.memory))),
            (&mut self.disk, pick(stats.and_then(|s| s.disk), host.map(|h| h.disk))),
        ];
        for (bar, value) in gauges {
            match value {
                Some(v) => bar.update(&v, now),
                None => bar.clear(),
            };
        }
    }

    pub fn notify(
        &mut self,
        severity: Severity,
        title: Option<&str>,
        message: impl Into<String>,
        now: Instant,
    ) -> u64 {
        self.notifications.push(severity, title, message, now)
    }

    /// Per-frame housekeeping. Returns true while something still animates.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.notifications.expire(now);
        self.counters.is_animating(now)
    }

    pub fn visible_events(&self, now: DateTime<Local>) -> Vec<&EventRow> {
        self.filters.apply(self.events.rows(), now)
    }

    pub fn visible_notifications(&self, now: DateTime<Local>) -> Vec<&NotificationRecord> {
        self.filters.apply(self.notifications.iter(), now)
    }
}

fn hourly_series(derived: &DerivedSeries) -> ChartSeries {
    ChartSeries::new(
        (0..24).map(|h| format!("{h:02}:00")).collect(),
        derived.hourly.iter().map(|n| f64::from(*n)).collect(),
    )
}

fn sources_series(derived: &DerivedSeries) -> ChartSeries {
    ChartSeries::new(
        derived.source_labels(),
        derived
            .source_counts()
            .into_iter()
            .map(f64::from)
            .collect(),
    )
}

fn status_series(derived: &DerivedSeries) -> ChartSeries {
    ChartSeries::new(
        AttackStatus::ALL
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
        AttackStatus::ALL
            .iter()
            .map(|s| f64::from(derived.status.get(*s)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttackEvent;

    fn state() -> DashboardState {
        DashboardState::new(&WidgetConfig::default(), AlertThresholds::default())
    }

    fn event(time: &str, ip: &str, status: &str) -> AttackEvent {
        AttackEvent {
            time: time.into(),
            user: "bob@lab".into(),
            ip: ip.into(),
            pwd: Some("hunter2".into()),
            status: status.into(),
        }
    }

    fn failure() -> FetchError {
        FetchError::Status {
            path: "/stats".into(),
            status: 500,
        }
    }

    #[test]
    fn stats_snapshot_drives_widgets() {
        let now = Instant::now();
        let mut st = state();
        let stats = StatsSnapshot {
            attacks: 3,
            recent: vec![
                event("10:01:00", "10.0.0.1", "FAIL"),
                event("10:05:00", "10.0.0.1", "BLOCKED"),
                event("11:00:00", "10.0.0.2", "LOCKED"),
            ],
            security_score: Some(65.0),
            cpu: Some(85.0),
            ..Default::default()
        };
        st.apply(Channel::Stats, Ok(ChannelSnapshot::Stats(stats)), now);

        assert_eq!(st.counters.attacks.target(), 3.0);
        assert_eq!(st.derived.hourly[10], 2);
        assert_eq!(st.events.rows().len(), 3);
        assert_eq!(st.sources_chart.instance().unwrap().series.labels.len(), 2);
        assert_eq!(st.cpu.value(), Some(85.0));
        assert_eq!(st.posture.level(), Some(crate::models::RiskLevel::Yellow));
        // score 65 is below the 70 alert bound
        assert_eq!(st.notifications.latest().unwrap().title.as_deref(), Some("Security Score Low"));
    }

    #[test]
    fn repeated_alerting_snapshot_is_not_deduplicated() {
        let now = Instant::now();
        let mut st = state();
        let stats = StatsSnapshot {
            attacks: 120,
            detected: Some(110),
            ..Default::default()
        };
        st.apply(Channel::Stats, Ok(ChannelSnapshot::Stats(stats.clone())), now);
        assert_eq!(st.notifications.len(), 1);
        st.apply(Channel::Stats, Ok(ChannelSnapshot::Stats(stats)), now);
        assert_eq!(st.notifications.len(), 2);
        assert!(st
            .notifications
            .iter()
            .all(|n| n.title.as_deref() == Some("High Threat Activity")));
    }

    #[test]
    fn empty_event_list_shows_placeholder() {
        let now = Instant::now();
        let mut st = state();
        st.apply(
            Channel::Stats,
            Ok(ChannelSnapshot::Stats(StatsSnapshot::default())),
            now,
        );
        assert_eq!(st.sources_chart.placeholder(), Some("No data"));
        assert!(st.derived.top_sources.is_empty());
    }

    #[test]
    fn failures_mark_channel_stale_until_success() {
        let now = Instant::now();
        let mut st = state();
        st.apply(
            Channel::Users,
            Ok(ChannelSnapshot::Users(vec!["alice".into()])),
            now,
        );
        for _ in 0..2 {
            st.apply(Channel::Users, Err(failure()), now);
        }
        assert!(!st.is_stale(Channel::Users));
        st.apply(Channel::Users, Err(failure()), now);
        assert!(st.is_stale(Channel::Users));
        // failed polls leave the last good data in place
        assert_eq!(st.users, vec!["alice".to_string()]);
        assert!(!st.is_stale(Channel::Stats));

        st.apply(Channel::Users, Ok(ChannelSnapshot::Users(Vec::new())), now);
        assert!(!st.is_stale(Channel::Users));
        assert_eq!(st.health(Channel::Users).failures, 0);
    }

    #[test]
    fn host_sample_fills_missing_gauges() {
        let now = Instant::now();
        let mut st = state();
        st.set_host_sample(
            HostSample {
                cpu: 12.0,
                memory: 70.0,
                disk: 40.0,
            },
            now,
        );
        assert_eq!(st.memory.value(), Some(70.0));

        let stats = StatsSnapshot {
            memory: Some(30.0),
            ..Default::default()
        };
        st.apply(Channel::Stats, Ok(ChannelSnapshot::Stats(stats)), now);
        assert_eq!(st.memory.value(), Some(30.0));
        assert_eq!(st.cpu.value(), Some(12.0));
    }

    #[test]
    fn snapshot_without_values_clears_posture_and_gauges() {
        let now = Instant::now();
        let mut st = state();
        let scored = StatsSnapshot {
            security_score: Some(65.0),
            cpu: Some(40.0),
            disk: Some(55.0),
            ..Default::default()
        };
        st.apply(Channel::Stats, Ok(ChannelSnapshot::Stats(scored)), now);
        assert_eq!(st.posture.level(), Some(crate::models::RiskLevel::Yellow));
        assert_eq!(st.disk.value(), Some(55.0));

        st.apply(
            Channel::Stats,
            Ok(ChannelSnapshot::Stats(StatsSnapshot::default())),
            now,
        );
        assert_eq!(st.posture.level(), None);
        assert_eq!(st.posture.score(), None);
        assert_eq!(st.cpu.label(), "--");
        assert_eq!(st.disk.value(), None);
    }

    #[test]
    fn access_lists_replace_together() {
        let now = Instant::now();
        let mut st = state();
        st.apply(
            Channel::AccessLists,
            Ok(ChannelSnapshot::AccessLists {
                blocked: vec!["mallory".into()],
                whitelist: vec!["10.0.0.9".into()],
            }),
            now,
        );
        assert_eq!(st.access.blocked, vec!["mallory".to_string()]);
        assert_eq!(st.access.whitelist, vec!["10.0.0.9".to_string()]);
    }
}
