use std::time::{Duration, Instant};

use super::{RenderResult, Widget};

/// Numeric counter that eases from the value on screen to a new target.
#[derive(Debug, Clone)]
pub struct StatField {
    from: f64,
    target: f64,
    started: Option<Instant>,
    duration: Duration,
}

impl StatField {
    pub fn new(duration: Duration) -> Self {
        Self {
            from: 0.0,
            target: 0.0,
            started: None,
            duration,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    fn progress(&self, now: Instant) -> f64 {
        let Some(started) = self.started else {
            return 1.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        (elapsed / self.duration.as_secs_f64()).min(1.0)
    }

    /// Value on screen at `now`, floored like the rendered text.
    pub fn displayed(&self, now: Instant) -> i64 {
        let p = self.progress(now);
        let eased = 1.0 - (1.0 - p).powi(3);
        (self.from + (self.target - self.from) * eased).floor() as i64
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.started.is_some() && self.progress(now) < 1.0
    }
}

impl Widget for StatField {
    type Input = f64;

    fn update(&mut self, target: &f64, now: Instant) -> RenderResult {
        if *target == self.target && !self.is_animating(now) {
            return RenderResult::Unchanged;
        }
        self.from = self.displayed(now) as f64;
        self.target = *target;
        self.started = Some(now);
        RenderResult::Updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eases_out_towards_target() {
        let t0 = Instant::now();
        let mut field = StatField::new(Duration::from_millis(1000));
        assert_eq!(field.update(&1000.0, t0), RenderResult::Updated);

        assert_eq!(field.displayed(t0), 0);
        // 1 - 0.5^3 = 0.875
        assert_eq!(field.displayed(t0 + Duration::from_millis(500)), 875);
        assert_eq!(field.displayed(t0 + Duration::from_millis(1000)), 1000);
        assert_eq!(field.displayed(t0 + Duration::from_secs(9)), 1000);
        assert!(!field.is_animating(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn retrigger_restarts_from_value_on_screen() {
        let t0 = Instant::now();
        let mut field = StatField::new(Duration::from_millis(1000));
        field.update(&1000.0, t0);

        let mid = t0 + Duration::from_millis(500);
        let on_screen = field.displayed(mid);
        field.update(&2000.0, mid);

        assert_eq!(field.displayed(mid), on_screen);
        assert_eq!(field.displayed(mid + Duration::from_millis(1000)), 2000);
    }

    #[test]
    fn same_target_after_settling_is_unchanged() {
        let t0 = Instant::now();
        let mut field = StatField::new(Duration::from_millis(100));
        field.update(&42.0, t0);
        let later = t0 + Duration::from_secs(1);
        assert_eq!(field.update(&42.0, later), RenderResult::Unchanged);
        assert_eq!(field.displayed(later), 42);
    }

    #[test]
    fn counts_down_as_well() {
        let t0 = Instant::now();
        let mut field = StatField::new(Duration::ZERO);
        field.update(&120.0, t0);
        field.update(&0.0, t0);
        assert_eq!(field.displayed(t0), 0);
    }
}
