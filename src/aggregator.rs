//! Chart-ready series derived from a stats snapshot's event list.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{AttackEvent, AttackStatus};

pub const TOP_SOURCES: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub blocked: u32,
    pub success: u32,
    pub fail: u32,
}

impl StatusBreakdown {
    pub fn get(&self, status: AttackStatus) -> u32 {
        match status {
            AttackStatus::Blocked => self.blocked,
            AttackStatus::Success => self.success,
            AttackStatus::Fail => self.fail,
        }
    }

    pub fn total(&self) -> u32 {
        self.blocked + self.success + self.fail
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedSeries {
    pub hourly: [u32; 24],
    pub top_sources: Vec<(String, u32)>,
    pub status: StatusBreakdown,
}

impl DerivedSeries {
    pub fn source_labels(&self) -> Vec<String> {
        self.top_sources.iter().map(|(ip, _)| ip.clone()).collect()
    }

    pub fn source_counts(&self) -> Vec<u32> {
        self.top_sources.iter().map(|(_, n)| *n).collect()
    }
}

pub fn derive(events: &[AttackEvent]) -> DerivedSeries {
    DerivedSeries {
        hourly: hourly_histogram(events),
        top_sources: top_sources(events, TOP_SOURCES),
        status: status_breakdown(events),
    }
}

/// Hour component of `HH:...`; `None` when it is not an hour of the day.
pub fn parse_hour(time: &str) -> Option<usize> {
    let head = time.split(':').next()?.trim();
    let hour: usize = head.parse().ok()?;
    (hour < 24).then_some(hour)
}

pub fn hourly_histogram(events: &[AttackEvent]) -> [u32; 24] {
    let mut buckets = [0u32; 24];
    for hour in events.iter().filter_map(|ev| parse_hour(&ev.time)) {
        buckets[hour] += 1;
    }
    buckets
}

/// Counts per source address, highest first. Ties keep first-seen order.
pub fn top_sources(events: &[AttackEvent], limit: usize) -> Vec<(String, u32)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, u32)> = Vec::new();

    for ev in events {
        match index.get(ev.ip.as_str()) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(ev.ip.as_str(), counts.len());
                counts.push((ev.ip.clone(), 1));
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

pub fn status_breakdown(events: &[AttackEvent]) -> StatusBreakdown {
    let mut out = StatusBreakdown::default();
    for ev in events {
        match ev.status_kind() {
            Some(AttackStatus::Blocked) => out.blocked += 1,
            Some(AttackStatus::Success) => out.success += 1,
            Some(AttackStatus::Fail) => out.fail += 1,
            None => {}
        }
    }
    out
}
