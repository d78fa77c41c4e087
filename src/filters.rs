use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

use crate::models::{AttackStatus, NotificationRecord, Severity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    LastHour,
    #[default]
    #[serde(rename = "24h")]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [Self::LastHour, Self::LastDay, Self::LastWeek, Self::All];

    pub fn window(&self) -> Option<Duration> {
        match self {
            Self::LastHour => Some(Duration::hours(1)),
            Self::LastDay => Some(Duration::hours(24)),
            Self::LastWeek => Some(Duration::days(7)),
            Self::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastHour => "1h",
            Self::LastDay => "24h",
            Self::LastWeek => "7d",
            Self::All => "all",
        }
    }
}

/// Anything the filter bar can hide or show.
pub trait Filterable {
    fn timestamp(&self) -> Option<DateTime<Local>>;
    fn severity(&self) -> Option<Severity>;
    fn status(&self) -> Option<&str>;
}

impl Filterable for NotificationRecord {
    fn timestamp(&self) -> Option<DateTime<Local>> {
        Some(self.timestamp)
    }

    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn status(&self) -> Option<&str> {
        None
    }
}

/// Operator's current filter selection; `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub time_range: TimeRange,
    pub severity: Option<Severity>,
    pub status: Option<AttackStatus>,
}

impl FilterState {
    pub fn is_open(&self) -> bool {
        self.time_range == TimeRange::All && self.severity.is_none() && self.status.is_none()
    }

    pub fn admits<T: Filterable + ?Sized>(&self, item: &T, now: DateTime<Local>) -> bool {
        if let (Some(window), Some(ts)) = (self.time_range.window(), item.timestamp()) {
            if now.signed_duration_since(ts) > window {
                return false;
            }
        }
        if let Some(wanted) = self.severity {
            if item.severity() != Some(wanted) {
                return false;
            }
        }
        if let Some(wanted) = self.status {
            if item.status() != Some(wanted.as_str()) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a, T: Filterable>(
        &self,
        items: impl IntoIterator<Item = &'a T>,
        now: DateTime<Local>,
    ) -> Vec<&'a T>
    where
        T: 'a,
    {
        items.into_iter().filter(|i| self.admits(*i, now)).collect()
    }
}
