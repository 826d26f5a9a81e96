// parser/mod.rs
// Best-effort, single-pass parser for simulator telemetry logs.
//
// Every log variant the simulator writes goes through one `LogParser`, selected
// by an explicit `LogFormat`. Malformed data lines are dropped; only a broken
// timestep header stops the scan.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, Lines};
use tracing::{debug, trace};
use ultraviolet::DVec2;

use crate::error::{Result, VizError};

pub mod tabular;

#[cfg(test)]
mod tests;

pub use tabular::TabularData;

/// Step field of the line holding the initial value in two-column energy logs.
const BASELINE_STEP: &str = "-1";

/// Layout of a log file. Always chosen by the caller, never guessed from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum LogFormat {
    /// `x y` lines, no headers. Every `entities` valid lines make one frame.
    BarePair { entities: usize },
    /// `# Timestep N` headers followed by `id x y` lines.
    HeaderedPosition,
    /// `# Timestep N` headers followed by `id x y energy` lines.
    HeaderedEnergy,
    /// `# Timestep N` headers followed by a single total value.
    HeaderedScalar,
    /// `step value` lines, `#` comments allowed.
    TwoColumnScalar,
    /// `step,id,x,y` rows as written by the trajectory CSV dumper.
    TrajectoryCsv,
}

impl LogFormat {
    pub fn is_headered(&self) -> bool {
        matches!(
            self,
            LogFormat::HeaderedPosition | LogFormat::HeaderedEnergy | LogFormat::HeaderedScalar
        )
    }

    /// Whether records of this format carry per-entity positions.
    pub fn has_positions(&self) -> bool {
        !matches!(self, LogFormat::HeaderedScalar | LogFormat::TwoColumnScalar)
    }

    fn validate(&self) -> Result<()> {
        match self {
            LogFormat::BarePair { entities: 0 } => Err(VizError::InvalidConfig(
                "bare-pair logs need an entity count of at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// One entity's state as read from a single data line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Absent for bare-pair logs, where the line position within the frame identifies the entity.
    pub id: Option<u64>,
    pub position: DVec2,
    pub energy: Option<f64>,
}

/// Everything the log says about one timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestepRecord {
    pub timestep: u64,
    pub entries: Vec<Observation>,
    /// Pre-reduced scalar (total energy, entropy) for scalar formats.
    pub value: Option<f64>,
    /// The scalar is the run's reference value, logged before the first step.
    pub baseline: bool,
}

impl TimestepRecord {
    pub fn new(timestep: u64) -> Self {
        Self {
            timestep,
            entries: Vec::new(),
            value: None,
            baseline: false,
        }
    }

    /// Reference value written on a `-1 value` line ahead of the first step.
    pub fn baseline(value: f64) -> Self {
        Self {
            value: Some(value),
            baseline: true,
            ..Self::new(0)
        }
    }

    /// A record with neither observations nor a scalar is never emitted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.value.is_none()
    }

    pub fn positions(&self) -> Vec<DVec2> {
        self.entries.iter().map(|e| e.position).collect()
    }
}

/// Lazily turns a line stream into `TimestepRecord`s.
///
/// Single pass: once the reader is exhausted (or an error is yielded) the
/// iterator returns `None` forever.
pub struct LogParser<R> {
    lines: Lines<R>,
    format: LogFormat,
    line_no: usize,
    open: Option<TimestepRecord>,
    next_frame: u64,
    skipped: usize,
    emitted: usize,
    finished: bool,
}

/// Start parsing `reader` as `format`.
pub fn parse<R: BufRead>(reader: R, format: LogFormat) -> Result<LogParser<R>> {
    LogParser::new(reader, format)
}

impl<R: BufRead> LogParser<R> {
    pub fn new(reader: R, format: LogFormat) -> Result<Self> {
        format.validate()?;
        Ok(Self {
            lines: reader.lines(),
            format,
            line_no: 0,
            open: None,
            next_frame: 0,
            skipped: 0,
            emitted: 0,
            finished: false,
        })
    }

    /// Number of data lines dropped as noise so far.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    fn skip(&mut self, line: &str) {
        self.skipped += 1;
        trace!(line = self.line_no, text = line, "dropping unparseable line");
    }

    /// Feed one line; returns a record when the line completes one.
    fn consume(&mut self, raw: &str) -> Result<Option<TimestepRecord>> {
        let line = raw.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if let Some(comment) = line.strip_prefix('#') {
            if self.format.is_headered() {
                if let Some(timestep) = parse_header(comment, self.line_no, line)? {
                    let finished = self.open.replace(TimestepRecord::new(timestep));
                    return Ok(finished.filter(|r| !r.is_empty()));
                }
            }
            return Ok(None);
        }

        match self.format {
            LogFormat::BarePair { entities } => {
                let Some(position) = parse_pair(line) else {
                    self.skip(line);
                    return Ok(None);
                };
                let frame = self.next_frame;
                let record = self.open.get_or_insert_with(|| TimestepRecord::new(frame));
                record.entries.push(Observation {
                    id: None,
                    position,
                    energy: None,
                });
                if record.entries.len() == entities {
                    self.next_frame += 1;
                    return Ok(self.open.take());
                }
                Ok(None)
            }
            LogFormat::HeaderedPosition | LogFormat::HeaderedEnergy => {
                let expected = if self.format == LogFormat::HeaderedEnergy { 4 } else { 3 };
                let accepted = match (self.open.as_mut(), parse_observation(line, expected)) {
                    (Some(record), Some(obs)) => {
                        record.entries.push(obs);
                        true
                    }
                    _ => false,
                };
                if !accepted {
                    self.skip(line);
                }
                Ok(None)
            }
            LogFormat::HeaderedScalar => {
                // Only the first value under a header counts.
                let accepted = match (self.open.as_mut(), single_value(line)) {
                    (Some(record), Some(value)) if record.value.is_none() => {
                        record.value = Some(value);
                        true
                    }
                    _ => false,
                };
                if !accepted {
                    self.skip(line);
                }
                Ok(None)
            }
            LogFormat::TwoColumnScalar => {
                let mut fields = line.split_whitespace();
                let parsed = match (fields.next(), fields.next(), fields.next()) {
                    (Some(step), Some(value), None) => value.parse::<f64>().ok().and_then(|value| {
                        if step == BASELINE_STEP {
                            return Some(TimestepRecord::baseline(value));
                        }
                        let mut record = TimestepRecord::new(step.parse::<u64>().ok()?);
                        record.value = Some(value);
                        Some(record)
                    }),
                    _ => None,
                };
                if parsed.is_none() {
                    self.skip(line);
                }
                Ok(parsed)
            }
            LogFormat::TrajectoryCsv => {
                let Some((step, obs)) = parse_csv_row(line) else {
                    self.skip(line);
                    return Ok(None);
                };
                let boundary = self.open.as_ref().is_some_and(|r| r.timestep != step);
                let finished = if boundary { self.open.take() } else { None };
                self.open
                    .get_or_insert_with(|| TimestepRecord::new(step))
                    .entries
                    .push(obs);
                Ok(finished)
            }
        }
    }

    fn finish(&mut self) -> Option<TimestepRecord> {
        self.finished = true;
        debug!(
            format = ?self.format,
            lines = self.line_no,
            records = self.emitted,
            skipped = self.skipped,
            "log scan complete"
        );
        self.open.take().filter(|r| !r.is_empty())
    }
}

impl<R: BufRead> Iterator for LogParser<R> {
    type Item = Result<TimestepRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
                None => {
                    let last = self.finish();
                    if last.is_some() {
                        self.emitted += 1;
                    }
                    return last.map(Ok);
                }
            };
            self.line_no += 1;
            match self.consume(&line) {
                Ok(Some(record)) => {
                    self.emitted += 1;
                    return Some(Ok(record));
                }
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// `Some(timestep)` for a `Timestep N` header, `None` for any other comment.
fn parse_header(comment: &str, line_no: usize, raw: &str) -> Result<Option<u64>> {
    let mut tokens = comment.split_whitespace();
    if tokens.next() != Some("Timestep") {
        return Ok(None);
    }
    tokens
        .next()
        .and_then(|t| t.parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| VizError::MalformedHeader {
            line: line_no,
            text: raw.to_string(),
        })
}

fn parse_pair(line: &str) -> Option<DVec2> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(x), Some(y), None) => Some(DVec2::new(x.parse().ok()?, y.parse().ok()?)),
        _ => None,
    }
}

fn single_value(line: &str) -> Option<f64> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next()) {
        (Some(v), None) => v.parse().ok(),
        _ => None,
    }
}

/// `id x y` or `id x y energy`, with exactly `expected` fields.
fn parse_observation(line: &str, expected: usize) -> Option<Observation> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != expected {
        return None;
    }
    let id = fields[0].parse::<u64>().ok()?;
    let x = fields[1].parse::<f64>().ok()?;
    let y = fields[2].parse::<f64>().ok()?;
    let energy = match fields.get(3) {
        Some(e) => Some(e.parse::<f64>().ok()?),
        None => None,
    };
    Some(Observation {
        id: Some(id),
        position: DVec2::new(x, y),
        energy,
    })
}

fn parse_csv_row(line: &str) -> Option<(u64, Observation)> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 4 {
        return None;
    }
    let step = fields[0].parse::<u64>().ok()?;
    let id = fields[1].parse::<u64>().ok()?;
    let x = fields[2].parse::<f64>().ok()?;
    let y = fields[3].parse::<f64>().ok()?;
    Some((
        step,
        Observation {
            id: Some(id),
            position: DVec2::new(x, y),
            energy: None,
        },
    ))
}
