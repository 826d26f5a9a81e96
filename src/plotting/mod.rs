// plotting/mod.rs
// Static line/scatter plots of scalar series and tabular measurements

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use plotters::prelude::*;
use ultraviolet::DVec2;

use crate::config::PlotConfig;
use crate::error::{Result, VizError};
use crate::io::ensure_parent_dir;
use crate::render::colors::entity_color;
use crate::series::ScalarSeries;
use crate::viewport::Viewport;

pub mod export;
pub mod heatmap;

#[cfg(test)]
mod tests;

pub use export::{export_series, render_series, ExportFormat};
pub use heatmap::{draw_heatmap, HeatCell, HeatMap};

const PLOT_MARGIN_FRACTION: f64 = 0.05;
const DASH_SEGMENTS: usize = 40;
const DASHES_PER_SEGMENT: usize = 6;
const MARKER_PX: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub markers: bool,
    pub dashed: bool,
}

impl PlotSeries {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
            markers: false,
            dashed: false,
        }
    }

    pub fn from_series(label: impl Into<String>, series: &ScalarSeries) -> Self {
        Self::new(label, series.xy())
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
}

/// Everything needed to draw one static plot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlotSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub log_x: bool,
    pub log_y: bool,
    pub series: Vec<PlotSeries>,
    /// Horizontal dashed line, e.g. the initial energy.
    pub reference_line: Option<(String, f64)>,
}

impl PlotSpec {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            ..Self::default()
        }
    }

    pub fn with_series(mut self, series: PlotSeries) -> Self {
        self.series.push(series);
        self
    }

    pub fn log_axes(mut self, log_x: bool, log_y: bool) -> Self {
        self.log_x = log_x;
        self.log_y = log_y;
        self
    }

    pub fn with_reference_line(mut self, label: impl Into<String>, y: f64) -> Self {
        self.reference_line = Some((label.into(), y));
        self
    }
}

/// Map a value onto a plot axis. Log axes plot `log10(v)`; values that cannot
/// be shown (non-finite, or non-positive on a log axis) map to `None`.
fn axis_value(v: f64, log: bool) -> Option<f64> {
    if !v.is_finite() {
        return None;
    }
    if log {
        (v > 0.0).then(|| v.log10())
    } else {
        Some(v)
    }
}

fn project(points: &[(f64, f64)], log_x: bool, log_y: bool) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|&(x, y)| Some((axis_value(x, log_x)?, axis_value(y, log_y)?)))
        .collect()
}

/// Projected series plus the bounds that hold all of them.
pub(crate) struct Layout {
    pub series: Vec<Vec<(f64, f64)>>,
    pub reference_y: Option<f64>,
    pub bounds: Viewport,
}

pub(crate) fn layout(spec: &PlotSpec) -> Result<Layout> {
    let series: Vec<Vec<(f64, f64)>> = spec
        .series
        .iter()
        .map(|s| project(&s.points, spec.log_x, spec.log_y))
        .collect();
    let reference_y = spec
        .reference_line
        .as_ref()
        .and_then(|(_, y)| axis_value(*y, spec.log_y));

    let mut extent: Vec<DVec2> = series
        .iter()
        .flatten()
        .map(|&(x, y)| DVec2::new(x, y))
        .collect();
    if extent.is_empty() {
        return Err(VizError::EmptyResult { what: "plottable points" });
    }
    if let (Some(y), Some(first)) = (reference_y, extent.first().copied()) {
        extent.push(DVec2::new(first.x, y));
    }
    let bounds = Viewport::compute(extent, PLOT_MARGIN_FRACTION, None)?;
    Ok(Layout {
        series,
        reference_y,
        bounds,
    })
}

/// Split a polyline into alternating visible pieces, `pieces` per segment.
fn dash_path(points: &[(f64, f64)], pieces: usize) -> Vec<Vec<(f64, f64)>> {
    let pieces = pieces.max(2);
    points
        .windows(2)
        .flat_map(|w| {
            let (a, b) = (w[0], w[1]);
            let step = ((b.0 - a.0) / pieces as f64, (b.1 - a.1) / pieces as f64);
            (0..pieces).step_by(2).map(move |i| {
                let t0 = i as f64;
                let t1 = t0 + 1.0;
                vec![
                    (a.0 + step.0 * t0, a.1 + step.1 * t0),
                    (a.0 + step.0 * t1, a.1 + step.1 * t1),
                ]
            })
        })
        .collect()
}

fn log_tick(v: &f64) -> String {
    format!("{:.0e}", 10f64.powf(*v))
}

fn plain_tick(v: &f64) -> String {
    format!("{v:.3}")
}

/// Draw `spec` to a PNG at `path`.
pub fn draw_plot(spec: &PlotSpec, path: &Path, config: &PlotConfig) -> Result<()> {
    let layout = layout(spec)?;
    let vp = layout.bounds;
    let labels = config.draw_labels && cfg!(feature = "labels");

    ensure_parent_dir(path)?;
    let root = BitMapBackend::new(path, (config.width_px, config.height_px)).into_drawing_area();
    root.fill(&WHITE).map_err(VizError::render)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(15);
    if labels {
        builder
            .caption(&spec.title, ("sans-serif", 22))
            .x_label_area_size(40)
            .y_label_area_size(70);
    }
    let mut chart = builder
        .build_cartesian_2d(vp.x_min..vp.x_max, vp.y_min..vp.y_max)
        .map_err(VizError::render)?;

    let x_fmt: fn(&f64) -> String = if spec.log_x { log_tick } else { plain_tick };
    let y_fmt: fn(&f64) -> String = if spec.log_y { log_tick } else { plain_tick };
    let mut mesh = chart.configure_mesh();
    mesh.light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.15));
    if labels {
        mesh.x_desc(spec.x_label.as_str())
            .y_desc(spec.y_label.as_str())
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt);
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw().map_err(VizError::render)?;

    for (i, (series, points)) in spec.series.iter().zip(&layout.series).enumerate() {
        if points.is_empty() {
            debug!(label = %series.label, "series has nothing to draw on these axes");
            continue;
        }
        let color = entity_color(i);
        let style = ShapeStyle::from(&color).stroke_width(2);
        if series.dashed {
            chart
                .draw_series(
                    dash_path(points, DASHES_PER_SEGMENT)
                        .into_iter()
                        .map(|seg| PathElement::new(seg, style)),
                )
                .map_err(VizError::render)?;
        } else {
            let anno = chart
                .draw_series(LineSeries::new(points.iter().copied(), style))
                .map_err(VizError::render)?;
            if labels {
                anno.label(series.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }
        }
        if series.markers {
            chart
                .draw_series(points.iter().map(|&p| Circle::new(p, MARKER_PX, color.filled())))
                .map_err(VizError::render)?;
        }
    }

    if let Some(y) = layout.reference_y {
        let style = ShapeStyle::from(&BLACK.mix(0.6)).stroke_width(1);
        let anno = chart
            .draw_series(
                dash_path(&[(vp.x_min, y), (vp.x_max, y)], DASH_SEGMENTS)
                    .into_iter()
                    .map(|seg| PathElement::new(seg, style)),
            )
            .map_err(VizError::render)?;
        if let (true, Some((label, _))) = (labels, spec.reference_line.as_ref()) {
            anno.label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
    }

    if labels {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(VizError::render)?;
    }

    root.present().map_err(VizError::render)?;
    info!(path = %path.display(), title = %spec.title, series = spec.series.len(), "plot written");
    Ok(())
}
