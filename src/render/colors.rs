// render/colors.rs
// Distinct, stable colours per entity slot, plus the sequential ramp for heat maps.

use palette::{Hsluv, IntoColor, Srgb};
use plotters::style::RGBColor;

const GOLDEN_ANGLE_DEG: f32 = 137.507_76;
/// Copper-ish hue for the heat-map ramp.
const RAMP_HUE_DEG: f32 = 35.0;

/// HSLuv hue stepped by the golden angle, so neighbouring slots never look alike
/// and a slot keeps its colour across every frame.
pub fn entity_color(slot: usize) -> RGBColor {
    let h = (slot as f32 * GOLDEN_ANGLE_DEG) % 360.0;
    to_rgb(Hsluv::new(h, 90.0, 65.0))
}

/// Dark-to-light ramp over `t` in `[0, 1]`; out-of-range `t` is clamped.
pub fn ramp_color(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) } as f32;
    to_rgb(Hsluv::new(RAMP_HUE_DEG, 80.0, 8.0 + 80.0 * t))
}

fn to_rgb(c: Hsluv) -> RGBColor {
    let rgb: Srgb = c.into_color();
    RGBColor(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}
