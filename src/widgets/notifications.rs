use chrono::Local;
use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

use super::{RenderResult, Widget};
use crate::{
    alerts::Alert,
    models::{NotificationRecord, Severity},
};

pub const DEFAULT_CAPACITY: usize = 50;

/// Most-recent-first notification list with bounded length.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    items: VecDeque<NotificationRecord>,
    deadlines: HashMap<u64, Instant>,
    capacity: usize,
    ttl: Option<Duration>,
    next_id: u64,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, None)
    }
}

impl NotificationFeed {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            deadlines: HashMap::new(),
            capacity,
            ttl,
            next_id: 1,
        }
    }

    pub fn push(
        &mut self,
        severity: Severity,
        title: Option<&str>,
        message: impl Into<String>,
        now: Instant,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.items.push_front(NotificationRecord {
            id,
            message: message.into(),
            severity,
            title: title.map(str::to_string),
            timestamp: Local::now(),
        });
        if let Some(ttl) = self.ttl {
            self.deadlines.insert(id, now + ttl);
        }

        while self.items.len() > self.capacity {
            if let Some(evicted) = self.items.pop_back() {
                self.deadlines.remove(&evicted.id);
            }
        }
        id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        self.deadlines.remove(&id);
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drops every notification whose auto-dismiss deadline has passed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let due: Vec<u64> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        due.iter().filter(|id| self.dismiss(**id)).count()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&NotificationRecord> {
        self.items.front()
    }

    /// Badge text; hidden when the feed is empty.
    pub fn badge(&self) -> Option<String> {
        match self.items.len() {
            0 => None,
            n if n > 99 => Some("99+".to_string()),
            n => Some(n.to_string()),
        }
    }

    /// Case-insensitive match on message or title.
    pub fn search(&self, query: &str) -> Vec<&NotificationRecord> {
        let needle = query.to_lowercase();
        self.items
            .iter()
            .filter(|n| {
                n.message.to_lowercase().contains(&needle)
                    || n
                        .title
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

impl Widget for NotificationFeed {
    type Input = [Alert];

    fn update(&mut self, alerts: &[Alert], now: Instant) -> RenderResult {
        if alerts.is_empty() {
            return RenderResult::Unchanged;
        }
        for alert in alerts {
            self.push(alert.severity, Some(alert.title), alert.message.clone(), now);
        }
        RenderResult::Updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first_and_bounded() {
        let now = Instant::now();
        let mut feed = NotificationFeed::new(50, None);
        for i in 0..50 {
            feed.push(Severity::Info, None, format!("event {i}"), now);
        }
        assert_eq!(feed.len(), 50);
        assert_eq!(feed.latest().unwrap().message, "event 49");

        feed.push(Severity::Danger, Some("High Threat Activity"), "event 50", now);
        assert_eq!(feed.len(), 50);
        assert_eq!(feed.latest().unwrap().message, "event 50");
        // exactly the oldest one went away
        assert!(feed.iter().all(|n| n.message != "event 0"));
        assert!(feed.iter().any(|n| n.message == "event 1"));
    }

    #[test]
    fn dismiss_removes_and_updates_badge() {
        let now = Instant::now();
        let mut feed = NotificationFeed::default();
        assert_eq!(feed.badge(), None);
        let a = feed.push(Severity::Info, None, "a", now);
        feed.push(Severity::Info, None, "b", now);
        assert_eq!(feed.badge().as_deref(), Some("2"));

        assert!(feed.dismiss(a));
        assert!(!feed.dismiss(a));
        assert_eq!(feed.badge().as_deref(), Some("1"));
    }

    #[test]
    fn badge_caps_display_above_99() {
        let now = Instant::now();
        let mut feed = NotificationFeed::new(200, None);
        for _ in 0..120 {
            feed.push(Severity::Warning, None, "x", now);
        }
        assert_eq!(feed.badge().as_deref(), Some("99+"));
    }

    #[test]
    fn auto_dismiss_after_ttl() {
        let t0 = Instant::now();
        let mut feed = NotificationFeed::new(50, Some(Duration::from_millis(5000)));
        feed.push(Severity::Success, None, "first", t0);
        feed.push(Severity::Success, None, "second", t0 + Duration::from_millis(3000));

        assert_eq!(feed.expire(t0 + Duration::from_millis(4999)), 0);
        assert_eq!(feed.expire(t0 + Duration::from_millis(5000)), 1);
        assert_eq!(feed.latest().unwrap().message, "second");
        assert_eq!(feed.expire(t0 + Duration::from_millis(8000)), 1);
        assert!(feed.is_empty());
    }

    #[test]
    fn search_matches_message_and_title() {
        let now = Instant::now();
        let mut feed = NotificationFeed::default();
        feed.push(Severity::Warning, Some("High CPU Usage"), "CPU usage at 95%", now);
        feed.push(Severity::Info, None, "Dashboard refreshed", now);

        assert_eq!(feed.search("cpu").len(), 1);
        assert_eq!(feed.search("HIGH").len(), 1);
        assert_eq!(feed.search("dashboard").len(), 1);
        assert!(feed.search("memory").is_empty());
    }
}
