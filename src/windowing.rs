use ndarray::{Array2, ArrayView2};

/// Widths at or below this are treated as degenerate and trigger the
/// auto-window fallback.
const WIDTH_EPSILON: f32 = 1e-6;

/// Map a floating-point intensity slice to 8-bit display values.
///
/// The window `[center - width/2, center + width/2]` is clipped first, then
/// normalized to [0, 1] and scaled to [0, 255] with round-to-nearest.
/// Clipping before normalizing makes out-of-window values saturate instead
/// of distorting the in-window contrast. A non-finite or near-zero width
/// falls back to the slice's own min/max; a degenerate range maps everything
/// to 0. `inverted` flips the result for MONOCHROME1-style sources.
pub fn apply_window(slice: ArrayView2<f32>, center: f32, width: f32, inverted: bool) -> Array2<u8> {
    let (vmin, vmax) = if !width.is_finite() || width <= WIDTH_EPSILON {
        intensity_range(&slice)
    } else {
        (center - width / 2.0, center + width / 2.0)
    };
    let range = vmax - vmin;

    slice.mapv(|v| {
        let clipped = v.max(vmin).min(vmax);
        let normalized = if range > 0.0 {
            (clipped - vmin) / range
        } else {
            0.0
        };
        let level = (normalized * 255.0 + 0.5) as u8;
        if inverted { 255 - level } else { level }
    })
}

fn intensity_range(slice: &ArrayView2<f32>) -> (f32, f32) {
    let mut vmin = f32::INFINITY;
    let mut vmax = f32::NEG_INFINITY;
    for &v in slice.iter() {
        if v.is_nan() {
            continue;
        }
        vmin = vmin.min(v);
        vmax = vmax.max(v);
    }
    if vmin > vmax {
        // empty or all-NaN slice
        (0.0, 0.0)
    } else {
        (vmin, vmax)
    }
}
