use std::time::Instant;

use super::{RenderResult, Widget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bars,
    Breakdown,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn new(labels: Vec<String>, values: Vec<f64>) -> Self {
        Self { labels, values }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// One constructed chart bound to a slot.
#[derive(Debug, Clone)]
pub struct ChartInstance {
    pub id: u64,
    pub series: ChartSeries,
    pub revision: u64,
}

/// Persistent chart holder. Same-shape updates mutate the live instance;
/// a shape change destroys it and constructs a fresh one.
#[derive(Debug, Clone)]
pub struct ChartSlot {
    kind: ChartKind,
    placeholder: Option<&'static str>,
    instance: Option<ChartInstance>,
    constructed: u64,
    destroyed: u64,
}

impl ChartSlot {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            placeholder: None,
            instance: None,
            constructed: 0,
            destroyed: 0,
        }
    }

    pub fn with_placeholder(mut self, text: &'static str) -> Self {
        self.placeholder = Some(text);
        self
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn instance(&self) -> Option<&ChartInstance> {
        self.instance.as_ref()
    }

    /// Placeholder text when the slot has nothing to draw.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self.instance {
            Some(_) => None,
            None => self.placeholder,
        }
    }

    pub fn constructed(&self) -> u64 {
        self.constructed
    }

    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }

    fn destroy(&mut self) {
        if self.instance.take().is_some() {
            self.destroyed += 1;
        }
    }

    fn construct(&mut self, series: &ChartSeries) {
        self.constructed += 1;
        self.instance = Some(ChartInstance {
            id: self.constructed,
            series: series.clone(),
            revision: 0,
        });
    }
}

impl Widget for ChartSlot {
    type Input = ChartSeries;

    fn update(&mut self, series: &ChartSeries, _now: Instant) -> RenderResult {
        if series.is_empty() && self.placeholder.is_some() {
            self.destroy();
            return RenderResult::Placeholder;
        }

        let compatible = self
            .instance
            .as_mut()
            .filter(|live| live.series.labels.len() == series.labels.len());
        if let Some(live) = compatible {
            if live.series == *series {
                return RenderResult::Unchanged;
            }
            live.series = series.clone();
            live.revision += 1;
            return RenderResult::Updated;
        }

        self.destroy();
        self.construct(series);
        RenderResult::Rebuilt
    }
}
