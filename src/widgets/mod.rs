//! Render-sink widgets.
//!
//! Each widget owns only its visual state and exposes `update`; the egui
//! painting in `app` reads that state and never mutates it. This keeps the
//! polling and aggregation path testable without a display.

pub mod badge;
pub mod chart;
pub mod notifications;
pub mod progress;
pub mod stat;
pub mod table;

use std::time::Instant;

pub use badge::{BadgeTone, StatusBadge};
pub use chart::{ChartKind, ChartSeries, ChartSlot};
pub use notifications::NotificationFeed;
pub use progress::{ProgressBar, ProgressTier};
pub use stat::StatField;
pub use table::{EventRow, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderResult {
    Unchanged,
    Updated,
    /// Backing instance was torn down and constructed again.
    Rebuilt,
    /// Nothing to draw; a "no data" placeholder is shown instead.
    Placeholder,
}

pub trait Widget {
    type Input: ?Sized;

    fn update(&mut self, input: &Self::Input, now: Instant) -> RenderResult;
}
