use chrono::{DateTime, Local};
use std::time::Instant;

use super::{BadgeTone, RenderResult, Widget};
use crate::{
    filters::Filterable,
    models::{AttackEvent, Severity},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub time: String,
    pub user: String,
    pub ip: String,
    pub pwd: String,
    pub status: String,
    pub tone: BadgeTone,
}

impl From<&AttackEvent> for EventRow {
    fn from(ev: &AttackEvent) -> Self {
        Self {
            time: ev.time.clone(),
            user: ev.user.clone(),
            ip: ev.ip.clone(),
            pwd: ev.pwd.clone().unwrap_or_default(),
            status: ev.status.clone(),
            tone: BadgeTone::for_status(&ev.status),
        }
    }
}

impl Filterable for EventRow {
    fn timestamp(&self) -> Option<DateTime<Local>> {
        // rows only carry a clock time, so time-range filters never hide them
        None
    }

    fn severity(&self) -> Option<Severity> {
        None
    }

    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }
}

/// Row set that is replaced wholesale on every update.
#[derive(Debug, Clone)]
pub struct Table<R> {
    rows: Vec<R>,
    revision: u64,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            revision: 0,
        }
    }
}

impl<R> Table<R> {
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R: Clone> Widget for Table<R> {
    type Input = [R];

    fn update(&mut self, rows: &[R], _now: Instant) -> RenderResult {
        self.rows = rows.to_vec();
        self.revision += 1;
        RenderResult::Updated
    }
}
