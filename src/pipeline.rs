// pipeline.rs
// One invocation: open the log, reduce it, render it, write the artifacts.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{VizConfig, SERIES_PREVIEW_POINTS};
use crate::error::{Result, VizError};
use crate::io::{artifact_path, open_source, source_stem};
use crate::parser::{parse, LogFormat, TabularData};
use crate::plotting::{draw_heatmap, draw_plot, export_series, ExportFormat, HeatMap, PlotSeries, PlotSpec};
use crate::render::{write_animation, write_still, AnimationRenderer, RenderContext};
use crate::series::{aggregate, scaling_reference, Complexity, Reducer, ScalarSeries};
use crate::trajectory::TrajectoryStore;
use crate::viewport::Viewport;

/// What to produce from which source.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// Trajectory animation (GIF) plus a final-state still (PNG).
    Animate { log: PathBuf, format: LogFormat },
    /// Total energy over time; several logs are overlaid on one plot.
    EnergyPlot { logs: Vec<PathBuf>, format: LogFormat },
    /// Any pre-reduced scalar log, e.g. the entropy log.
    ScalarPlot {
        log: PathBuf,
        format: LogFormat,
        reducer: Reducer,
        title: String,
        y_label: String,
    },
    /// Named columns of a measurement table against one x column.
    TablePlot(TablePlot),
    /// One value column of a gridded table drawn as coloured cells.
    HeatMap(HeatMapPlot),
    /// Reduced series written out as data instead of an image.
    Export {
        log: PathBuf,
        format: LogFormat,
        reducer: Reducer,
        export: ExportFormat,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TablePlot {
    pub file: PathBuf,
    pub x: String,
    pub ys: Vec<String>,
    pub log_x: bool,
    pub log_y: bool,
    /// Keep only rows where this column equals the value.
    pub filter: Option<(String, f64)>,
    /// Dashed growth-law guide anchored on the first y column.
    pub reference: Option<Complexity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatMapPlot {
    pub file: PathBuf,
    pub x: String,
    pub y: String,
    pub value: String,
}

/// Files written by one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artifacts {
    pub files: Vec<PathBuf>,
    pub frames: usize,
    pub points: usize,
}

/// Reducer that yields total energy for a given log layout.
pub fn energy_reducer(format: LogFormat) -> Reducer {
    match format {
        LogFormat::HeaderedEnergy => Reducer::SumEnergy,
        _ => Reducer::Identity,
    }
}

pub fn run(job: &Job, config: &VizConfig) -> Result<Artifacts> {
    config.validate()?;
    match job {
        Job::Animate { log, format } => animate(log, *format, config),
        Job::EnergyPlot { logs, format } => energy_plot(logs, *format, config),
        Job::ScalarPlot {
            log,
            format,
            reducer,
            title,
            y_label,
        } => {
            let series = load_series(log, *format, *reducer)?;
            let spec = PlotSpec::new(title.as_str(), "timestep", y_label.as_str())
                .with_series(PlotSeries::from_series(y_label.as_str(), &series));
            let path = output_path(config, &source_stem(log), "png");
            draw_plot(&spec, &path, &config.plot)?;
            Ok(Artifacts {
                files: vec![path],
                frames: 0,
                points: series.len(),
            })
        }
        Job::TablePlot(table) => table_plot(table, config),
        Job::HeatMap(job) => heat_map(job, config),
        Job::Export {
            log,
            format,
            reducer,
            export,
        } => {
            let series = load_series(log, *format, *reducer)?;
            let stem = source_stem(log);
            let path = output_path(config, &stem, export.extension());
            export_series(&series, &stem, *export, &path)?;
            Ok(Artifacts {
                files: vec![path],
                frames: 0,
                points: series.len(),
            })
        }
    }
}

fn output_path(config: &VizConfig, stem: &str, ext: &str) -> PathBuf {
    artifact_path(&config.output.dir, stem, config.output.variant.as_deref(), ext)
}

/// Parse and reduce one log. The source is closed before this returns.
pub fn load_series(log: &Path, format: LogFormat, reducer: Reducer) -> Result<ScalarSeries> {
    let series = aggregate(parse(open_source(log)?, format)?, reducer)?;
    if series.is_empty() {
        return Err(VizError::EmptyResult {
            what: "series points",
        });
    }
    let preview: Vec<f64> = series
        .head(SERIES_PREVIEW_POINTS)
        .iter()
        .map(|p| p.value)
        .collect();
    info!(
        path = %log.display(),
        points = series.len(),
        first = ?preview,
        min = ?series.min(),
        max = ?series.max(),
        "series loaded"
    );
    if let Some(drift) = series.relative_drift() {
        info!(path = %log.display(), drift, "relative drift from initial value");
    }
    Ok(series)
}

pub fn load_trajectories(log: &Path, format: LogFormat) -> Result<TrajectoryStore> {
    if !format.has_positions() {
        return Err(VizError::InvalidConfig(format!(
            "{format:?} logs carry no positions to animate"
        )));
    }
    TrajectoryStore::from_records(parse(open_source(log)?, format)?)
}

fn animate(log: &Path, format: LogFormat, config: &VizConfig) -> Result<Artifacts> {
    let store = load_trajectories(log, format)?;
    let viewport = Viewport::from_config(store.positions(), &config.viewport)?;
    info!(?viewport, frames = store.frame_count(), "rendering animation");

    let renderer = AnimationRenderer::new(&store, viewport);
    let ctx = RenderContext::from(&config.animation);
    let stem = source_stem(log);

    // The still and the animation are independent products of the same store.
    let still = output_path(config, &format!("{stem}_final"), "png");
    write_still(&still, &ctx, &renderer.final_snapshot()?)?;
    let gif = output_path(config, &stem, "gif");
    let frames = write_animation(&gif, &ctx, renderer.all_frames())?;

    Ok(Artifacts {
        files: vec![gif, still],
        frames,
        points: store.positions().count(),
    })
}

/// Overlay of every log's total energy, with a dashed line at the first log's initial energy.
fn energy_spec(logs: &[PathBuf], format: LogFormat) -> Result<(PlotSpec, usize)> {
    let reducer = energy_reducer(format);
    let mut spec = PlotSpec::new("Total energy over time", "timestep", "total energy");
    let mut points = 0;
    for log in logs {
        let series = load_series(log, format, reducer)?;
        if spec.reference_line.is_none() {
            if let Some(e0) = series.initial() {
                spec = spec.with_reference_line(format!("initial energy {e0:.6e}"), e0);
            }
        }
        points += series.len();
        spec = spec.with_series(PlotSeries::from_series(source_stem(log), &series));
    }
    if logs.len() > 1 {
        spec.series.iter_mut().for_each(|s| s.markers = true);
    }
    Ok((spec, points))
}

fn energy_plot(logs: &[PathBuf], format: LogFormat, config: &VizConfig) -> Result<Artifacts> {
    let first = logs.first().ok_or_else(|| {
        VizError::InvalidConfig("energy plot needs at least one log".to_string())
    })?;
    let (spec, points) = energy_spec(logs, format)?;

    let stem = match logs.len() {
        1 => source_stem(first),
        _ => format!("{}_overlay", source_stem(first)),
    };
    let path = output_path(config, &stem, "png");
    draw_plot(&spec, &path, &config.plot)?;
    Ok(Artifacts {
        files: vec![path],
        frames: 0,
        points,
    })
}

fn table_plot(job: &TablePlot, config: &VizConfig) -> Result<Artifacts> {
    let mut table = TabularData::read(open_source(&job.file)?)?;
    if let Some((column, value)) = &job.filter {
        table = table.filter_eq(column, *value)?;
    }
    if table.is_empty() {
        return Err(VizError::EmptyResult { what: "table rows" });
    }
    let table = table.sorted_by(&job.x)?;

    let title = format!("{} vs {}", job.ys.join(", "), job.x);
    let mut spec = PlotSpec::new(title, job.x.as_str(), job.ys.join(", ")).log_axes(job.log_x, job.log_y);
    let mut points = 0;
    for y in &job.ys {
        let pairs = table.pairs(&job.x, y)?;
        points += pairs.len();
        spec = spec.with_series(PlotSeries::new(y.as_str(), pairs).with_markers());
    }
    if let Some(complexity) = job.reference {
        let guide = spec
            .series
            .first()
            .map(|s| scaling_reference(&s.points, complexity))
            .unwrap_or_default();
        if guide.is_empty() {
            warn!(?complexity, "no usable anchor for the scaling guide");
        } else {
            spec = spec.with_series(PlotSeries::new(complexity.label(), guide).dashed());
        }
    }

    let path = output_path(config, &source_stem(&job.file), "png");
    draw_plot(&spec, &path, &config.plot)?;
    Ok(Artifacts {
        files: vec![path],
        frames: 0,
        points,
    })
}

fn heat_map(job: &HeatMapPlot, config: &VizConfig) -> Result<Artifacts> {
    let table = TabularData::read(open_source(&job.file)?)?;
    let map = HeatMap::from_table(&table, &job.x, &job.y, &job.value)?;
    let dropped = table.len() - map.len();
    if dropped > 0 {
        warn!(dropped, "rows with non-finite coordinates left off the heat map");
    }
    let title = format!("{} over ({}, {})", job.value, job.x, job.y);
    let path = output_path(config, &source_stem(&job.file), "png");
    draw_heatmap(&map, &title, &path, &config.plot)?;
    Ok(Artifacts {
        files: vec![path],
        frames: 0,
        points: map.len(),
    })
}
