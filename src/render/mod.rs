// render/mod.rs
// Frame production for trajectory animations.
//
// `AnimationRenderer` only reads the store and the viewport; pixels are the
// business of a `FrameSink`.

pub mod colors;
pub mod sink;


pub use sink::{write_animation, write_still, FrameSink, GifSink, PngSink};

use plotters::style::RGBColor;
use ultraviolet::DVec2;

use crate::config::AnimationConfig;
use crate::error::{Result, VizError};
use crate::trajectory::TrajectoryStore;
use crate::viewport::Viewport;

/// Caller-owned drawing settings, passed to every sink explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub width_px: u32,
    pub height_px: u32,
    pub frame_delay_ms: u32,
    pub trail_opacity: f64,
    pub marker_px: u32,
    pub dark_background: bool,
    pub draw_labels: bool,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::from(&AnimationConfig::default())
    }
}

impl From<&AnimationConfig> for RenderContext {
    fn from(config: &AnimationConfig) -> Self {
        Self {
            width_px: config.width_px,
            height_px: config.height_px,
            frame_delay_ms: config.frame_delay_ms,
            trail_opacity: config.trail_opacity,
            marker_px: config.marker_px,
            dark_background: config.dark_background,
            draw_labels: config.draw_labels,
        }
    }
}

impl RenderContext {
    /// Text needs a font backend, which only the `labels` feature brings in.
    pub fn labels_enabled(&self) -> bool {
        self.draw_labels && cfg!(feature = "labels")
    }

    pub fn background(&self) -> RGBColor {
        if self.dark_background {
            RGBColor(0, 0, 0)
        } else {
            RGBColor(255, 255, 255)
        }
    }

    pub fn foreground(&self) -> RGBColor {
        if self.dark_background {
            RGBColor(220, 220, 220)
        } else {
            RGBColor(20, 20, 20)
        }
    }
}

/// One entity as it appears in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityFrame<'a> {
    pub id: u64,
    pub position: DVec2,
    /// History up to and including the current frame, borrowed from the store.
    pub trail: &'a [DVec2],
}

impl EntityFrame<'_> {
    /// A single point is not a trail, so the first frame draws none.
    pub fn has_trail(&self) -> bool {
        self.trail.len() > 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame<'a> {
    pub frame_index: usize,
    pub timestep: u64,
    pub viewport: Viewport,
    pub entities: Vec<EntityFrame<'a>>,
}

/// Read-only view over a store and a fixed viewport.
///
/// Every frame is a pure function of its index, so an animation and a final
/// snapshot can come from the same renderer in any order.
#[derive(Debug, Clone, Copy)]
pub struct AnimationRenderer<'a> {
    store: &'a TrajectoryStore,
    viewport: Viewport,
}

impl<'a> AnimationRenderer<'a> {
    pub fn new(store: &'a TrajectoryStore, viewport: Viewport) -> Self {
        Self { store, viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn frame_count(&self) -> usize {
        self.store.frame_count()
    }

    pub fn frame(&self, index: usize) -> Result<RenderedFrame<'a>> {
        let timestep = self.store.timestep(index).ok_or(VizError::FrameOutOfRange {
            index,
            frames: self.store.frame_count(),
        })?;
        let store = self.store;
        let entities = store
            .ids()
            .iter()
            .enumerate()
            .filter_map(|(slot, &id)| {
                let trail = &store.history_slot(slot)?[..=index];
                Some(EntityFrame {
                    id,
                    position: trail[index],
                    trail,
                })
            })
            .collect();
        Ok(RenderedFrame {
            frame_index: index,
            timestep,
            viewport: self.viewport,
            entities,
        })
    }

    /// Lazily render `indices` in the order given.
    pub fn frames<I>(&self, indices: I) -> Frames<'a, I::IntoIter>
    where
        I: IntoIterator<Item = usize>,
    {
        Frames {
            renderer: *self,
            indices: indices.into_iter(),
        }
    }

    pub fn all_frames(&self) -> Frames<'a, std::ops::Range<usize>> {
        self.frames(0..self.frame_count())
    }

    /// Standalone still of one frame; needs no animation to have been produced.
    pub fn snapshot(&self, index: usize) -> Result<RenderedFrame<'a>> {
        self.frame(index)
    }

    pub fn final_snapshot(&self) -> Result<RenderedFrame<'a>> {
        match self.frame_count() {
            0 => Err(VizError::EmptyResult { what: "frames" }),
            n => self.frame(n - 1),
        }
    }
}

/// Iterator returned by [`AnimationRenderer::frames`].
pub struct Frames<'a, I> {
    renderer: AnimationRenderer<'a>,
    indices: I,
}

impl<'a, I: Iterator<Item = usize>> Iterator for Frames<'a, I> {
    type Item = Result<RenderedFrame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.indices.next().map(|i| self.renderer.frame(i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}
