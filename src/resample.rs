use ndarray::{Array2, ArrayView2, s};
use rayon::prelude::*;

use crate::enums::Orientation;
use crate::interpolator::Interpolator;

/// Aspect correction never produces an image larger than this on either
/// side; bigger targets are uniformly downscaled to bound memory use.
pub const MAX_DIMENSION: usize = 4096;

/// Marker intensity for the vertical (Sagittal) crosshair line.
const SAGITTAL_MARKER: u8 = 255;
/// Marker intensity for the horizontal (Coronal) crosshair line.
const CORONAL_MARKER: u8 = 192;

/// Resize an 8-bit slice so its displayed row:column pixel ratio matches the
/// physical (dy, dx) spacing in mm.
///
/// The width is kept and the height becomes `rows * dy / dx`, so anisotropic
/// voxels render with correct proportions. Non-positive or missing spacing
/// components default to square pixels.
pub fn resample_to_aspect(grid: &Array2<u8>, spacing: (f32, f32)) -> Array2<u8> {
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 {
        return grid.clone();
    }

    let (mut dy, mut dx) = spacing;
    if !(dx > 0.0) || !dx.is_finite() {
        dx = if dy > 0.0 && dy.is_finite() { dy } else { 1.0 };
    }
    if !(dy > 0.0) || !dy.is_finite() {
        dy = 1.0;
    }

    let mut target_w = cols;
    let mut target_h = ((rows as f32) * (dy / dx)).round().max(1.0) as usize;

    let largest = target_w.max(target_h);
    if largest > MAX_DIMENSION {
        let scale = MAX_DIMENSION as f32 / largest as f32;
        target_w = ((target_w as f32 * scale).round() as usize).max(1);
        target_h = ((target_h as f32 * scale).round() as usize).max(1);
    }

    if (target_h, target_w) == (rows, cols) {
        return grid.clone();
    }
    resize_bilinear(&grid.view(), target_h, target_w)
}

/// Fit an aspect-corrected slice into a fixed `(width, height)` canvas.
///
/// The image is uniformly scaled to fit, centered with letterbox borders,
/// and optionally overlaid with a line marking the cross-section position of
/// another orientation: vertical at the fractional column for Sagittal,
/// horizontal at the fractional row for Coronal, each with its own marker
/// intensity. An Axial crosshair has no in-plane line and is ignored.
pub fn fit_to_preview(
    grid: &Array2<u8>,
    spacing: (f32, f32),
    canvas: (usize, usize),
    crosshair: Option<(Orientation, f32)>,
) -> Array2<u8> {
    let (canvas_w, canvas_h) = canvas;
    let mut out = Array2::zeros((canvas_h, canvas_w));

    let corrected = resample_to_aspect(grid, spacing);
    let (src_h, src_w) = corrected.dim();
    if src_h == 0 || src_w == 0 || canvas_h == 0 || canvas_w == 0 {
        return out;
    }

    let scale = (canvas_w as f32 / src_w as f32).min(canvas_h as f32 / src_h as f32);
    let fitted_w = (((src_w as f32 * scale).round() as usize).max(1)).min(canvas_w);
    let fitted_h = (((src_h as f32 * scale).round() as usize).max(1)).min(canvas_h);
    let off_x = (canvas_w - fitted_w) / 2;
    let off_y = (canvas_h - fitted_h) / 2;

    let fitted = resize_bilinear(&corrected.view(), fitted_h, fitted_w);
    out.slice_mut(s![off_y..off_y + fitted_h, off_x..off_x + fitted_w])
        .assign(&fitted);

    if let Some((orientation, fraction)) = crosshair {
        let fraction = fraction.clamp(0.0, 1.0);
        match orientation {
            Orientation::Sagittal => {
                let x = off_x + (fraction * (fitted_w - 1) as f32).round() as usize;
                out.slice_mut(s![off_y..off_y + fitted_h, x]).fill(SAGITTAL_MARKER);
            }
            Orientation::Coronal => {
                let y = off_y + (fraction * (fitted_h - 1) as f32).round() as usize;
                out.slice_mut(s![y, off_x..off_x + fitted_w]).fill(CORONAL_MARKER);
            }
            Orientation::Axial => {}
        }
    }

    out
}

/// Bilinear resize with half-pixel-center sampling, rows in parallel.
fn resize_bilinear(src: &ArrayView2<u8>, height: usize, width: usize) -> Array2<u8> {
    let (src_h, src_w) = src.dim();

    let pixels: Vec<u8> = (0..height)
        .into_par_iter()
        .flat_map(|y| {
            (0..width)
                .map(|x| {
                    let norm_x = (x as f32 + 0.5) / width as f32;
                    let norm_y = (y as f32 + 0.5) / height as f32;

                    let src_x = (norm_x * src_w as f32 - 0.5).clamp(0.0, (src_w - 1) as f32);
                    let src_y = (norm_y * src_h as f32 - 0.5).clamp(0.0, (src_h - 1) as f32);

                    let value = Interpolator::bilinear_interpolate(src, src_y, src_x);
                    (value + 0.5) as u8
                })
                .collect::<Vec<u8>>()
        })
        .collect();

    Array2::from_shape_vec((height, width), pixels)
        .expect("resized buffer length matches target dimensions")
}
