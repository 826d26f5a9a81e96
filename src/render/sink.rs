// render/sink.rs
// plotters-backed frame output: GIF animations and PNG stills.

use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{debug, info};

use super::colors::entity_color;
use super::{RenderContext, RenderedFrame};
use crate::error::{Result, VizError};
use crate::io::ensure_parent_dir;

/// Destination for rendered frames.
pub trait FrameSink {
    fn draw_frame(&mut self, frame: &RenderedFrame<'_>) -> Result<()>;

    /// Flush whatever the sink still holds. Called once after the last frame.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Animated GIF, one image per `draw_frame`.
pub struct GifSink {
    root: DrawingArea<BitMapBackend<'static>, Shift>,
    ctx: RenderContext,
    path: PathBuf,
    frames: usize,
}

impl GifSink {
    pub fn create(path: &Path, ctx: &RenderContext) -> Result<Self> {
        ensure_parent_dir(path)?;
        let backend = BitMapBackend::gif(path, (ctx.width_px, ctx.height_px), ctx.frame_delay_ms)
            .map_err(VizError::render)?;
        Ok(Self {
            root: backend.into_drawing_area(),
            ctx: ctx.clone(),
            path: path.to_path_buf(),
            frames: 0,
        })
    }
}

impl FrameSink for GifSink {
    fn draw_frame(&mut self, frame: &RenderedFrame<'_>) -> Result<()> {
        draw_scene(&self.root, &self.ctx, frame)?;
        // each present() appends one GIF frame
        self.root.present().map_err(VizError::render)?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        info!(path = %self.path.display(), frames = self.frames, "animation written");
        Ok(())
    }
}

/// Single PNG still. A later frame overwrites an earlier one.
pub struct PngSink {
    ctx: RenderContext,
    path: PathBuf,
    written: bool,
}

impl PngSink {
    pub fn new(path: &Path, ctx: &RenderContext) -> Self {
        Self {
            ctx: ctx.clone(),
            path: path.to_path_buf(),
            written: false,
        }
    }
}

impl FrameSink for PngSink {
    fn draw_frame(&mut self, frame: &RenderedFrame<'_>) -> Result<()> {
        ensure_parent_dir(&self.path)?;
        let root = BitMapBackend::new(&self.path, (self.ctx.width_px, self.ctx.height_px))
            .into_drawing_area();
        draw_scene(&root, &self.ctx, frame)?;
        root.present().map_err(VizError::render)?;
        self.written = true;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if !self.written {
            return Err(VizError::EmptyResult { what: "frames" });
        }
        info!(path = %self.path.display(), "snapshot written");
        Ok(())
    }
}

/// Feed every frame into `sink`, then finish it. Fails on the first bad frame.
pub fn drain<'a, S, I>(sink: &mut S, frames: I) -> Result<usize>
where
    S: FrameSink + ?Sized,
    I: IntoIterator<Item = Result<RenderedFrame<'a>>>,
{
    let mut count = 0usize;
    for frame in frames {
        sink.draw_frame(&frame?)?;
        count += 1;
    }
    if count == 0 {
        return Err(VizError::EmptyResult { what: "frames" });
    }
    sink.finish()?;
    Ok(count)
}

pub fn write_animation<'a, I>(path: &Path, ctx: &RenderContext, frames: I) -> Result<usize>
where
    I: IntoIterator<Item = Result<RenderedFrame<'a>>>,
{
    let mut sink = GifSink::create(path, ctx)?;
    drain(&mut sink, frames)
}

pub fn write_still(path: &Path, ctx: &RenderContext, frame: &RenderedFrame<'_>) -> Result<()> {
    let mut sink = PngSink::new(path, ctx);
    sink.draw_frame(frame)?;
    sink.finish()
}

fn draw_scene<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    ctx: &RenderContext,
    frame: &RenderedFrame<'_>,
) -> Result<()> {
    let fg = ctx.foreground();
    area.fill(&ctx.background()).map_err(VizError::render)?;

    let vp = frame.viewport;
    let labels = ctx.labels_enabled();
    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if labels {
        builder
            .caption(
                format!("Timestep {}", frame.timestep),
                ("sans-serif", 20).into_font().color(&fg),
            )
            .x_label_area_size(30)
            .y_label_area_size(50);
    }
    let mut chart = builder
        .build_cartesian_2d(vp.x_min..vp.x_max, vp.y_min..vp.y_max)
        .map_err(VizError::render)?;

    let mut mesh = chart.configure_mesh();
    mesh.axis_style(fg.mix(0.6))
        .bold_line_style(fg.mix(0.12))
        .light_line_style(fg.mix(0.05));
    if labels {
        mesh.label_style(("sans-serif", 14).into_font().color(&fg));
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw().map_err(VizError::render)?;

    for (slot, entity) in frame.entities.iter().enumerate() {
        let color = entity_color(slot);
        if entity.has_trail() {
            chart
                .draw_series(LineSeries::new(
                    entity.trail.iter().map(|p| (p.x, p.y)),
                    color.mix(ctx.trail_opacity),
                ))
                .map_err(VizError::render)?;
        }
        chart
            .draw_series(std::iter::once(Circle::new(
                (entity.position.x, entity.position.y),
                ctx.marker_px,
                color.filled(),
            )))
            .map_err(VizError::render)?;
    }
    debug!(frame = frame.frame_index, entities = frame.entities.len(), "frame drawn");
    Ok(())
}
