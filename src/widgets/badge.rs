use std::time::Instant;

use super::{RenderResult, Widget};
use crate::models::{AttackStatus, RiskLevel};

/// Colour family of an event-row status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Success,
    Secondary,
    Danger,
}

impl BadgeTone {
    /// FAIL and anything unrecognised render as danger.
    pub fn for_status(raw: &str) -> Self {
        match AttackStatus::from_wire(raw) {
            Some(AttackStatus::Success) => Self::Success,
            Some(AttackStatus::Blocked) => Self::Secondary,
            Some(AttackStatus::Fail) | None => Self::Danger,
        }
    }
}

/// Security-posture indicator driven by the composite score.
#[derive(Debug, Clone, Default)]
pub struct StatusBadge {
    level: Option<RiskLevel>,
    score: Option<f64>,
}

impl StatusBadge {
    pub fn level(&self) -> Option<RiskLevel> {
        self.level
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Hides the badge when the latest snapshot carries no score.
    pub fn clear(&mut self) -> RenderResult {
        if self.level.is_none() && self.score.is_none() {
            return RenderResult::Unchanged;
        }
        self.level = None;
        self.score = None;
        RenderResult::Updated
    }
}

impl Widget for StatusBadge {
    type Input = f64;

    fn update(&mut self, score: &f64, _now: Instant) -> RenderResult {
        let level = RiskLevel::from_score(*score);
        let changed = self.level != Some(level) || self.score != Some(*score);
        self.level = Some(level);
        self.score = Some(*score);
        if changed {
            RenderResult::Updated
        } else {
            RenderResult::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_mapping_matches_status_table() {
        assert_eq!(BadgeTone::for_status("SUCCESS"), BadgeTone::Success);
        assert_eq!(BadgeTone::for_status("BLOCKED"), BadgeTone::Secondary);
        assert_eq!(BadgeTone::for_status("FAIL"), BadgeTone::Danger);
        assert_eq!(BadgeTone::for_status("TIMEOUT"), BadgeTone::Danger);
    }

    #[test]
    fn posture_follows_score() {
        let now = Instant::now();
        let mut badge = StatusBadge::default();
        assert_eq!(badge.level(), None);
        assert_eq!(badge.update(&91.0, now), RenderResult::Updated);
        assert_eq!(badge.level(), Some(RiskLevel::Green));
        assert_eq!(badge.update(&91.0, now), RenderResult::Unchanged);
        badge.update(&65.0, now);
        assert_eq!(badge.level(), Some(RiskLevel::Yellow));
        badge.update(&30.0, now);
        assert_eq!(badge.level().map(|l| l.as_str()), Some("ALERT"));
    }

    #[test]
    fn clear_hides_posture() {
        let now = Instant::now();
        let mut badge = StatusBadge::default();
        assert_eq!(badge.clear(), RenderResult::Unchanged);
        badge.update(&72.0, now);
        assert_eq!(badge.clear(), RenderResult::Updated);
        assert_eq!(badge.level(), None);
        assert_eq!(badge.score(), None);
    }
}
