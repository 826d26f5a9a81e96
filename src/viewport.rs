// viewport.rs
// Fixed axis bounds for a whole animation, computed once from every frame.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ultraviolet::DVec2;

use crate::config::{ViewportConfig, DEGENERATE_RELATIVE_SPAN, DEGENERATE_SPAN};
use crate::error::{Result, VizError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Viewport {
    /// Bounds over all `positions` (non-finite ones are ignored), widened by
    /// `margin_fraction` of each axis range on both ends. With a `target_aspect`
    /// (width / height) the x range is widened symmetrically until the ratio is
    /// met; y is never touched and neither axis ever shrinks.
    pub fn compute<I>(positions: I, margin_fraction: f64, target_aspect: Option<f64>) -> Result<Self>
    where
        I: IntoIterator<Item = DVec2>,
    {
        if !margin_fraction.is_finite() || margin_fraction < 0.0 {
            return Err(VizError::InvalidConfig(format!(
                "margin fraction must be finite and >= 0, got {margin_fraction}"
            )));
        }
        if let Some(aspect) = target_aspect {
            if !aspect.is_finite() || aspect <= 0.0 {
                return Err(VizError::InvalidConfig(format!(
                    "target aspect ratio must be positive, got {aspect}"
                )));
            }
        }

        let mut min = DVec2::broadcast(f64::INFINITY);
        let mut max = DVec2::broadcast(f64::NEG_INFINITY);
        let mut seen = 0usize;
        for p in positions {
            if !(p.x.is_finite() && p.y.is_finite()) {
                continue;
            }
            min = min.min_by_component(p);
            max = max.max_by_component(p);
            seen += 1;
        }
        if seen == 0 {
            return Err(VizError::EmptyResult { what: "positions" });
        }

        let (mut x_min, mut x_max) = pad(min.x, max.x, margin_fraction);
        let (y_min, y_max) = pad(min.y, max.y, margin_fraction);

        if let Some(aspect) = target_aspect {
            // Half-extents keep the arithmetic finite near f64::MAX.
            let half_width = 0.5 * x_max - 0.5 * x_min;
            let half_wanted = aspect * (0.5 * y_max - 0.5 * y_min);
            if half_width < half_wanted {
                let centre = 0.5 * x_min + 0.5 * x_max;
                x_min = clamp_finite(centre - half_wanted);
                x_max = clamp_finite(centre + half_wanted);
            }
        }

        let viewport = Self {
            x_min,
            x_max,
            y_min,
            y_max,
        };
        debug!(?viewport, positions = seen, "viewport computed");
        Ok(viewport)
    }

    pub fn from_config<I>(positions: I, config: &ViewportConfig) -> Result<Self>
    where
        I: IntoIterator<Item = DVec2>,
    {
        Self::compute(positions, config.margin_fraction, config.target_aspect)
    }

    pub fn contains(&self, p: DVec2) -> bool {
        (self.x_min..=self.x_max).contains(&p.x) && (self.y_min..=self.y_max).contains(&p.y)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn aspect(&self) -> f64 {
        self.width() / self.height()
    }
}

/// Axis extent plus margin, both ends clamped to finite values. A zero-width
/// axis gets a span around its value that never rounds away to nothing.
fn pad(lo: f64, hi: f64, margin_fraction: f64) -> (f64, f64) {
    if hi <= lo {
        let half = 0.5 * DEGENERATE_SPAN.max(lo.abs() * DEGENERATE_RELATIVE_SPAN);
        return (clamp_finite(lo - half), clamp_finite(lo + half));
    }
    // `hi - lo` may overflow; the halves never do.
    let m = margin_fraction * (0.5 * hi - 0.5 * lo);
    (clamp_finite(lo - 2.0 * m), clamp_finite(hi + 2.0 * m))
}

fn clamp_finite(v: f64) -> f64 {
    v.clamp(f64::MIN, f64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<DVec2> {
        vec![
            DVec2::new(-1.0, -1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.25, -0.5),
        ]
    }

    #[test]
    fn zero_margin_is_tight() {
        let vp = Viewport::compute(square(), 0.0, None).unwrap();
        assert_eq!(vp, Viewport { x_min: -1.0, x_max: 1.0, y_min: -1.0, y_max: 1.0 });
    }

    #[test]
    fn margin_contains_every_point() {
        let points = vec![
            DVec2::new(3.0, -7.5),
            DVec2::new(-2.25, 4.0),
            DVec2::new(100.0, 0.1),
            DVec2::new(f64::NAN, 1e9),
        ];
        let vp = Viewport::compute(points.clone(), 0.1, Some(1.5)).unwrap();
        for p in points.iter().filter(|p| p.x.is_finite()) {
            assert!(vp.contains(*p), "{p:?} outside {vp:?}");
        }
        // the NaN point's y never enters the extent
        assert!(vp.y_max < 1e9);
        assert!((vp.x_min - (-2.25 - 0.1 * 102.25)).abs() < 1e-9);
    }

    #[test]
    fn single_point_gets_a_span() {
        let vp = Viewport::compute([DVec2::new(2.0, -3.0)], 0.05, None).unwrap();
        assert_eq!(vp.width(), DEGENERATE_SPAN);
        assert_eq!(vp.height(), DEGENERATE_SPAN);
        assert!(vp.contains(DVec2::new(2.0, -3.0)));
    }

    #[test]
    fn aspect_widens_x_only() {
        let vp = Viewport::compute(square(), 0.0, Some(3.0)).unwrap();
        assert_eq!(vp.x_min, -3.0);
        assert_eq!(vp.x_max, 3.0);
        assert_eq!(vp.height(), 2.0);
        assert_eq!(vp.aspect(), 3.0);
    }

    #[test]
    fn already_wide_extent_is_left_alone() {
        // 10 wide by 2 high is already wider than 3:1, so x is not widened to
        // [-7.5, 7.5] even though that is the extent a 3:1 frame around y would
        // suggest. Only narrower-than-target extents are widened.
        let points = [DVec2::new(-5.0, -1.0), DVec2::new(5.0, 1.0)];
        let vp = Viewport::compute(points, 0.0, Some(3.0)).unwrap();
        assert_eq!(vp.width(), 10.0);
        assert_eq!(vp.height(), 2.0);
    }

    #[test]
    fn widening_never_shrinks() {
        let points = [DVec2::new(0.0, 0.0), DVec2::new(4.0, 1.0)];
        let raw = Viewport::compute(points, 0.05, None).unwrap();
        for aspect in [0.1, 1.0, 4.2, 10.0] {
            let vp = Viewport::compute(points, 0.05, Some(aspect)).unwrap();
            assert!(vp.width() >= raw.width());
            assert_eq!(vp.height(), raw.height());
        }
    }

    #[test]
    fn extreme_extent_still_contains_both_ends() {
        let points = [DVec2::new(-1e308, 0.0), DVec2::new(1e308, 1.0)];
        for margin in [0.0, 0.05] {
            let vp = Viewport::compute(points, margin, Some(2.0)).unwrap();
            for p in points {
                assert!(vp.contains(p), "{p:?} outside {vp:?}");
            }
            assert!(vp.x_min.is_finite() && vp.x_max.is_finite());
        }
    }

    #[test]
    fn degenerate_axis_far_from_zero_keeps_a_width() {
        let vp = Viewport::compute([DVec2::new(1e17, -2e20)], 0.05, None).unwrap();
        assert!(vp.width() > 0.0);
        assert!(vp.height() > 0.0);
        assert!(vp.x_min < 1e17 && 1e17 < vp.x_max);
        assert!(vp.contains(DVec2::new(1e17, -2e20)));

        let top = Viewport::compute([DVec2::new(f64::MAX, 0.0)], 0.0, None).unwrap();
        assert!(top.width() > 0.0);
        assert!(top.contains(DVec2::new(f64::MAX, 0.0)));
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(
            Viewport::compute(square(), -0.1, None),
            Err(VizError::InvalidConfig(_))
        ));
        assert!(matches!(
            Viewport::compute(square(), 0.0, Some(0.0)),
            Err(VizError::InvalidConfig(_))
        ));
        assert!(matches!(
            Viewport::compute(Vec::new(), 0.0, None),
            Err(VizError::EmptyResult { .. })
        ));
    }
}
