use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nbody_viz::config::{
    VizConfig, DEFAULT_ENERGY_LOG, DEFAULT_ENTROPY_LOG, DEFAULT_POSITION_LOG,
};
use nbody_viz::pipeline::{self, HeatMapPlot, Job, TablePlot};
use nbody_viz::plotting::ExportFormat;
use nbody_viz::series::{Complexity, Reducer};
use nbody_viz::LogFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plots and animations from N-body simulator logs")]
struct Cli {
    /// TOML configuration file (defaults to viz_config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Suffix for every output name, e.g. `openmp` for threaded-run logs
    #[arg(long, global = true)]
    variant: Option<String>,

    /// Directory that receives the artifacts
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trajectory animation plus a final-state still
    Animate {
        #[arg(default_value = DEFAULT_POSITION_LOG)]
        log: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
        /// Force a width:height ratio on the viewport
        #[arg(long)]
        aspect: Option<f64>,
    },
    /// Total energy over time, one curve per log
    Energy {
        #[arg(default_value = DEFAULT_ENERGY_LOG)]
        logs: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = FormatArg::HeaderedScalar)]
        format: FormatArg,
    },
    /// Shannon entropy over time
    Entropy {
        #[arg(default_value = DEFAULT_ENTROPY_LOG)]
        log: PathBuf,
    },
    /// Columns of a measurement table
    Table {
        file: PathBuf,
        #[arg(long)]
        x: String,
        #[arg(long = "y", required = true)]
        ys: Vec<String>,
        #[arg(long)]
        log_x: bool,
        #[arg(long)]
        log_y: bool,
        /// Keep rows where COLUMN equals VALUE, written `COLUMN=VALUE`
        #[arg(long = "where", value_parser = parse_filter)]
        filter: Option<(String, f64)>,
        #[arg(long, value_enum)]
        reference: Option<Complexity>,
    },
    /// Gridded table as a coloured heat map, e.g. the spatial error map
    Heatmap {
        file: PathBuf,
        #[arg(long, default_value = "x")]
        x: String,
        #[arg(long, default_value = "y")]
        y: String,
        #[arg(long, default_value = "log10_rel_error")]
        value: String,
    },
    /// Reduced series as CSV, JSON or TSV
    Export {
        log: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
        #[arg(long, value_enum, default_value_t = Reducer::SumEnergy)]
        reducer: Reducer,
        #[arg(long = "as", value_enum, default_value_t = ExportFormat::Csv)]
        export: ExportFormat,
    },
}

#[derive(Args, Debug)]
struct LayoutArgs {
    #[arg(long, value_enum, default_value_t = FormatArg::HeaderedPosition)]
    format: FormatArg,
    /// Entities per frame, bare-pair logs only
    #[arg(long, default_value_t = 1)]
    entities: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    BarePair,
    HeaderedPosition,
    HeaderedEnergy,
    HeaderedScalar,
    TwoColumn,
    TrajectoryCsv,
}

impl FormatArg {
    fn with_entities(self, entities: usize) -> LogFormat {
        match self {
            FormatArg::BarePair => LogFormat::BarePair { entities },
            FormatArg::HeaderedPosition => LogFormat::HeaderedPosition,
            FormatArg::HeaderedEnergy => LogFormat::HeaderedEnergy,
            FormatArg::HeaderedScalar => LogFormat::HeaderedScalar,
            FormatArg::TwoColumn => LogFormat::TwoColumnScalar,
            FormatArg::TrajectoryCsv => LogFormat::TrajectoryCsv,
        }
    }
}

impl LayoutArgs {
    fn format(&self) -> LogFormat {
        self.format.with_entities(self.entities)
    }
}

fn parse_filter(raw: &str) -> std::result::Result<(String, f64), String> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got {raw:?}"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad value in {raw:?}: {e}"))?;
    Ok((column.trim().to_string(), value))
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => VizConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => VizConfig::load_default().context("failed to load default config")?,
    };
    if let Some(dir) = cli.out_dir {
        config.output.dir = dir;
    }
    if cli.variant.is_some() {
        config.output.variant = cli.variant;
    }

    let job = match cli.command {
        Command::Animate { log, layout, aspect } => {
            if aspect.is_some() {
                config.viewport.target_aspect = aspect;
            }
            Job::Animate {
                log,
                format: layout.format(),
            }
        }
        Command::Energy { logs, format } => Job::EnergyPlot {
            logs,
            format: format.with_entities(1),
        },
        Command::Entropy { log } => Job::ScalarPlot {
            log,
            format: LogFormat::TwoColumnScalar,
            reducer: Reducer::ShannonEntropy,
            title: "Shannon entropy over time".to_string(),
            y_label: "entropy".to_string(),
        },
        Command::Table {
            file,
            x,
            ys,
            log_x,
            log_y,
            filter,
            reference,
        } => Job::TablePlot(TablePlot {
            file,
            x,
            ys,
            log_x,
            log_y,
            filter,
            reference,
        }),
        Command::Heatmap { file, x, y, value } => Job::HeatMap(HeatMapPlot { file, x, y, value }),
        Command::Export {
            log,
            layout,
            reducer,
            export,
        } => Job::Export {
            log,
            format: layout.format(),
            reducer,
            export,
        },
    };

    let artifacts = pipeline::run(&job, &config)?;
    for file in &artifacts.files {
        info!(path = %file.display(), "wrote");
    }
    info!(
        files = artifacts.files.len(),
        frames = artifacts.frames,
        points = artifacts.points,
        "done"
    );
    Ok(())
}
