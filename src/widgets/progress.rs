use std::time::Instant;

use super::{RenderResult, Widget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTier {
    Success,
    Warning,
    Danger,
}

impl ProgressTier {
    pub fn from_percent(value: f64) -> Self {
        if value > 80.0 {
            Self::Danger
        } else if value > 60.0 {
            Self::Warning
        } else {
            Self::Success
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// Percentage gauge. Out-of-range values are passed through unclamped.
#[derive(Debug, Clone, Default)]
pub struct ProgressBar {
    value: Option<f64>,
}

impl ProgressBar {
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn fill_fraction(&self) -> f64 {
        self.value.unwrap_or(0.0) / 100.0
    }

    pub fn tier(&self) -> ProgressTier {
        ProgressTier::from_percent(self.value.unwrap_or(0.0))
    }

    pub fn label(&self) -> String {
        match self.value {
            Some(v) => format!("{v:.0}%"),
            None => "--".to_string(),
        }
    }

    pub fn clear(&mut self) -> RenderResult {
        if self.value.take().is_some() {
            RenderResult::Updated
        } else {
            RenderResult::Unchanged
        }
    }
}

impl Widget for ProgressBar {
    type Input = f64;

    fn update(&mut self, value: &f64, _now: Instant) -> RenderResult {
        if self.value == Some(*value) {
            return RenderResult::Unchanged;
        }
        self.value = Some(*value);
        RenderResult::Updated
    }
}
