// plotting/export.rs
// Series export for post-processing outside the tool

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::io::write_atomically;
use crate::series::{ScalarSeries, SeriesPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Tsv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Tsv => "tsv",
        }
    }
}

#[derive(Serialize)]
struct SeriesDocument<'a> {
    title: &'a str,
    initial: Option<f64>,
    relative_drift: Option<f64>,
    points: &'a [SeriesPoint],
}

/// Series as text in the requested format.
pub fn render_series(series: &ScalarSeries, title: &str, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => Ok(export_delimited(series, title, ',')),
        ExportFormat::Tsv => Ok(export_delimited(series, title, '\t')),
        ExportFormat::Json => export_json(series, title),
    }
}

/// Write `series` to `path`. The file only appears once it is complete.
pub fn export_series(series: &ScalarSeries, title: &str, format: ExportFormat, path: &Path) -> Result<()> {
    let content = render_series(series, title, format)?;
    write_atomically(path, |out| {
        out.write_all(content.as_bytes())?;
        Ok(())
    })?;
    info!(path = %path.display(), points = series.len(), ?format, "series exported");
    Ok(())
}

fn export_delimited(series: &ScalarSeries, title: &str, sep: char) -> String {
    let mut content = String::new();

    // Header
    let _ = writeln!(content, "# Series Export");
    let _ = writeln!(content, "# Title: {title}");
    let _ = writeln!(content, "# Points: {}", series.len());
    if let Some(v0) = series.initial() {
        let _ = writeln!(content, "# Initial: {v0}");
    }
    if let Some(drift) = series.relative_drift() {
        let _ = writeln!(content, "# Relative drift: {drift:e}");
    }
    let _ = writeln!(content, "timestep{sep}value");

    for p in series.points() {
        let _ = writeln!(content, "{}{sep}{}", p.timestep, p.value);
    }
    content
}

fn export_json(series: &ScalarSeries, title: &str) -> Result<String> {
    let doc = SeriesDocument {
        title,
        initial: series.initial(),
        relative_drift: series.relative_drift(),
        points: series.points(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
