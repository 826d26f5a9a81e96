// plotting/heatmap.rs
// Gridded scalar fields (e.g. the spatial error map) drawn as coloured cells.

use std::path::Path;
use tracing::{debug, info};

use plotters::prelude::*;
use ultraviolet::DVec2;

use crate::config::{PlotConfig, DEGENERATE_SPAN};
use crate::error::{Result, VizError};
use crate::io::ensure_parent_dir;
use crate::parser::TabularData;
use crate::render::colors::ramp_color;
use crate::viewport::Viewport;

/// Cells whose value is not finite (e.g. `log10(0)`) are drawn in this colour.
const MISSING_CELL: RGBColor = RGBColor(200, 200, 200);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatCell {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// Samples on a regular grid, one cell per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatMap {
    cells: Vec<HeatCell>,
    cell_size: (f64, f64),
    range: Option<(f64, f64)>,
}

impl HeatMap {
    /// Build from three named columns. Rows with a non-finite coordinate are dropped.
    pub fn from_table(table: &TabularData, x: &str, y: &str, value: &str) -> Result<Self> {
        let xs = table.column(x)?;
        let ys = table.column(y)?;
        let vs = table.column(value)?;
        let cells: Vec<HeatCell> = xs
            .into_iter()
            .zip(ys)
            .zip(vs)
            .filter(|((x, y), _)| x.is_finite() && y.is_finite())
            .map(|((x, y), value)| HeatCell { x, y, value })
            .collect();
        Self::from_cells(cells)
    }

    pub fn from_cells(cells: Vec<HeatCell>) -> Result<Self> {
        if cells.is_empty() {
            return Err(VizError::EmptyResult {
                what: "heat map cells",
            });
        }
        let cell_size = (
            grid_step(cells.iter().map(|c| c.x)),
            grid_step(cells.iter().map(|c| c.y)),
        );
        let range = cells
            .iter()
            .map(|c| c.value)
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            });
        debug!(cells = cells.len(), ?cell_size, ?range, "heat map laid out");
        Ok(Self {
            cells,
            cell_size,
            range,
        })
    }

    pub fn cells(&self) -> &[HeatCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell_size(&self) -> (f64, f64) {
        self.cell_size
    }

    /// Smallest and largest finite value, `None` if no value is finite.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.range
    }

    /// Position of `value` on the colour ramp. A flat field sits mid-ramp.
    pub fn normalized(&self, value: f64) -> Option<f64> {
        let (lo, hi) = self.range?;
        if !value.is_finite() {
            return None;
        }
        if hi <= lo {
            return Some(0.5);
        }
        Some((value - lo) / (hi - lo))
    }

    fn corners(&self, c: &HeatCell) -> [(f64, f64); 2] {
        let (hw, hh) = (0.5 * self.cell_size.0, 0.5 * self.cell_size.1);
        [(c.x - hw, c.y - hh), (c.x + hw, c.y + hh)]
    }

    /// Bounds covering every cell edge.
    pub fn bounds(&self) -> Result<Viewport> {
        let corners = self
            .cells
            .iter()
            .flat_map(|c| self.corners(c))
            .map(|(x, y)| DVec2::new(x, y));
        Viewport::compute(corners, 0.0, None)
    }
}

/// Smallest gap between distinct coordinates, or `DEGENERATE_SPAN` for a single column or row.
fn grid_step(coords: impl Iterator<Item = f64>) -> f64 {
    let mut coords: Vec<f64> = coords.collect();
    coords.sort_by(f64::total_cmp);
    coords.dedup();
    coords
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0 && d.is_finite())
        .reduce(f64::min)
        .unwrap_or(DEGENERATE_SPAN)
}

/// Draw `map` to a PNG at `path`.
pub fn draw_heatmap(map: &HeatMap, title: &str, path: &Path, config: &PlotConfig) -> Result<()> {
    let vp = map.bounds()?;
    let labels = config.draw_labels && cfg!(feature = "labels");

    ensure_parent_dir(path)?;
    let root = BitMapBackend::new(path, (config.width_px, config.height_px)).into_drawing_area();
    root.fill(&WHITE).map_err(VizError::render)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(15);
    if labels {
        builder
            .caption(title, ("sans-serif", 22))
            .x_label_area_size(40)
            .y_label_area_size(60);
    }
    let mut chart = builder
        .build_cartesian_2d(vp.x_min..vp.x_max, vp.y_min..vp.y_max)
        .map_err(VizError::render)?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh();
    if labels {
        mesh.x_desc("x").y_desc("y");
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw().map_err(VizError::render)?;

    chart
        .draw_series(map.cells().iter().map(|c| {
            let color = map.normalized(c.value).map_or(MISSING_CELL, ramp_color);
            Rectangle::new(map.corners(c), color.filled())
        }))
        .map_err(VizError::render)?;

    root.present().map_err(VizError::render)?;
    info!(path = %path.display(), cells = map.len(), range = ?map.value_range(), "heat map written");
    Ok(())
}
