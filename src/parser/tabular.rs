// parser/tabular.rs
// Named-column measurement files (accuracy sweeps, scaling runs, thread timings).

use std::io::BufRead;
use tracing::debug;

use crate::error::{Result, VizError};

/// Numeric table whose columns are addressed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularData {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|f| !f.is_empty())
}

impl TabularData {
    /// The first non-blank line names the columns (a leading `#` is allowed);
    /// rows that do not match the header width or are not numeric are dropped.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        let mut skipped = 0usize;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if columns.is_none() {
                let names: Vec<String> = split_fields(line.trim_start_matches('#'))
                    .map(str::to_string)
                    .collect();
                if !names.is_empty() {
                    columns = Some(names);
                }
                continue;
            }
            let width = columns.as_ref().map_or(0, Vec::len);
            if line.starts_with('#') {
                continue;
            }
            let row: Option<Vec<f64>> = split_fields(line).map(|f| f.parse::<f64>().ok()).collect();
            match row {
                Some(row) if row.len() == width => rows.push(row),
                _ => skipped += 1,
            }
        }

        let columns = columns.ok_or(VizError::EmptyResult { what: "table header" })?;
        debug!(columns = ?columns, rows = rows.len(), skipped, "table loaded");
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| VizError::UnknownColumn {
                name: name.to_string(),
                available: self.columns.join(", "),
            })
    }

    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.index_of(name)?;
        Ok(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Keep rows whose `name` column equals `value` exactly.
    pub fn filter_eq(&self, name: &str, value: f64) -> Result<Self> {
        let idx = self.index_of(name)?;
        Ok(Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r[idx] == value)
                .cloned()
                .collect(),
        })
    }

    /// Stable ascending sort on `name`; NaN rows go last.
    pub fn sorted_by(&self, name: &str) -> Result<Self> {
        let idx = self.index_of(name)?;
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a[idx].total_cmp(&b[idx]));
        Ok(Self {
            columns: self.columns.clone(),
            rows,
        })
    }

    pub fn pairs(&self, x: &str, y: &str) -> Result<Vec<(f64, f64)>> {
        let xi = self.index_of(x)?;
        let yi = self.index_of(y)?;
        Ok(self.rows.iter().map(|r| (r[xi], r[yi])).collect())
    }
}
