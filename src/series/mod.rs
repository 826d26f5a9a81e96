// series/mod.rs
// Reduces timestep records to ordered (timestep, value) series.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::parser::TimestepRecord;


/// Rule that turns one record into (at most) one series point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Reducer {
    /// Sum of per-entity energies. Records with no energy field are skipped.
    SumEnergy,
    /// Pre-reduced entropy values; steps must strictly increase.
    ShannonEntropy,
    /// The record's own scalar, unchanged.
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestep: u64,
    pub value: f64,
}

/// Ordered scalar series. NaN and infinities are stored as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarSeries {
    points: Vec<SeriesPoint>,
    /// Value logged before the first step, when the log carries one.
    #[serde(default)]
    baseline: Option<f64>,
}

impl ScalarSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timestep: u64, value: f64) {
        self.points.push(SeriesPoint { timestep, value });
    }

    pub fn set_baseline(&mut self, value: f64) {
        self.baseline = Some(value);
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The logged baseline if there is one, else the first point.
    pub fn initial(&self) -> Option<f64> {
        self.baseline.or_else(|| self.points.first().map(|p| p.value))
    }

    /// Smallest value, ignoring NaN.
    pub fn min(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.value)
            .filter(|v| !v.is_nan())
            .reduce(f64::min)
    }

    /// Largest value, ignoring NaN.
    pub fn max(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.value)
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
    }

    /// Largest `|v - v0| / |v0|` over the series, the usual energy-conservation figure,
    /// with `v0` from `initial`. `None` when there are no points or `v0` is zero.
    pub fn relative_drift(&self) -> Option<f64> {
        let v0 = self.initial()?;
        if self.points.is_empty() || v0 == 0.0 || !v0.is_finite() {
            return None;
        }
        self.points
            .iter()
            .map(|p| ((p.value - v0) / v0).abs())
            .filter(|d| !d.is_nan())
            .reduce(f64::max)
    }

    pub fn head(&self, n: usize) -> &[SeriesPoint] {
        &self.points[..n.min(self.points.len())]
    }

    /// Points as `(timestep, value)` pairs for plotting.
    pub fn xy(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.timestep as f64, p.value))
            .collect()
    }
}

/// Incremental reducer, fed one record at a time so the parser never has to
/// hold more than the current record.
pub struct TimeSeriesAggregator {
    reducer: Reducer,
    series: ScalarSeries,
    last_step: Option<u64>,
    skipped: usize,
    rejected: usize,
}

impl TimeSeriesAggregator {
    pub fn new(reducer: Reducer) -> Self {
        Self {
            reducer,
            series: ScalarSeries::new(),
            last_step: None,
            skipped: 0,
            rejected: 0,
        }
    }

    pub fn push(&mut self, record: &TimestepRecord) {
        if record.baseline {
            match record.value {
                Some(value) => self.series.set_baseline(value),
                None => self.skipped += 1,
            }
            return;
        }
        match self.reducer {
            Reducer::SumEnergy => {
                let mut energies = record.entries.iter().filter_map(|e| e.energy).peekable();
                if energies.peek().is_none() {
                    self.skipped += 1;
                    return;
                }
                let total: f64 = energies.sum();
                self.series.push(record.timestep, total);
            }
            Reducer::ShannonEntropy => {
                let Some(value) = record.value else {
                    self.skipped += 1;
                    return;
                };
                if self.last_step.is_some_and(|last| record.timestep <= last) {
                    self.rejected += 1;
                    warn!(
                        step = record.timestep,
                        previous = self.last_step,
                        "rejecting non-monotonic entropy step"
                    );
                    return;
                }
                self.last_step = Some(record.timestep);
                self.series.push(record.timestep, value);
            }
            Reducer::Identity => match record.value {
                Some(value) => self.series.push(record.timestep, value),
                None => self.skipped += 1,
            },
        }
    }

    pub fn finish(self) -> ScalarSeries {
        debug!(
            reducer = ?self.reducer,
            points = self.series.len(),
            baseline = ?self.series.baseline(),
            skipped = self.skipped,
            rejected = self.rejected,
            "aggregation complete"
        );
        self.series
    }
}

/// Reduce a record stream into a series. The first stream error aborts the reduction.
pub fn aggregate<I>(records: I, reducer: Reducer) -> Result<ScalarSeries>
where
    I: IntoIterator<Item = Result<TimestepRecord>>,
{
    let mut aggregator = TimeSeriesAggregator::new(reducer);
    for record in records {
        aggregator.push(&record?);
    }
    Ok(aggregator.finish())
}

/// Growth law used for the dashed guide curves on scaling plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Complexity {
    Linear,
    NLogN,
}

impl Complexity {
    fn shape(&self, n: f64) -> f64 {
        match self {
            Complexity::Linear => n,
            Complexity::NLogN => n * n.log2(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Complexity::Linear => "O(N) reference",
            Complexity::NLogN => "O(N log N) reference",
        }
    }
}

/// `c * f(N)` anchored so it passes through the first measured point.
/// Empty when there is no usable anchor (no points, or `f(N0)` is zero).
pub fn scaling_reference(points: &[(f64, f64)], complexity: Complexity) -> Vec<(f64, f64)> {
    let Some(&(n0, y0)) = points.first() else {
        return Vec::new();
    };
    let base = complexity.shape(n0);
    if base == 0.0 || !base.is_finite() {
        return Vec::new();
    }
    let c = y0 / base;
    points
        .iter()
        .map(|&(n, _)| (n, c * complexity.shape(n)))
        .collect()
}
