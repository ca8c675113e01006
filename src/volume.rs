use crate::enums::Orientation;
use crate::frame::WindowLevel;
use crate::resample;
use crate::windowing;

use image::ImageBuffer;
use image::Luma;
use ndarray::Array2;
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::s;

/// A reconstructed 3D image volume.
///
/// `data` is stored as (depth, rows, cols) with the rescale transform
/// already applied; `spacing` is the physical step in mm along each axis.
/// The volume is immutable after construction, so plane extraction and
/// windowing are safe to run concurrently without locking.
pub struct Volume {
    data: Array3<f32>,
    spacing: (f32, f32, f32),
    inverted: bool,
    default_window: Option<WindowLevel>,
}

impl Volume {
    pub fn new(
        data: Array3<f32>,
        spacing: (f32, f32, f32),
        inverted: bool,
        default_window: Option<WindowLevel>,
    ) -> Self {
        let (d, r, c) = spacing;
        let spacing = (sanitize(d), sanitize(r), sanitize(c));
        Self {
            data,
            spacing,
            inverted,
            default_window,
        }
    }

    /// Dimensions as (depth, rows, cols).
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Voxel spacing in mm as (depth, row, col).
    pub fn spacing(&self) -> (f32, f32, f32) {
        self.spacing
    }

    /// Whether raw intensities are inverted for display (MONOCHROME1).
    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn default_window(&self) -> Option<WindowLevel> {
        self.default_window
    }

    /// Number of extractable slices along the given orientation's axis.
    pub fn axis_len(&self, orientation: Orientation) -> usize {
        let (depth, rows, cols) = self.data.dim();
        match orientation {
            Orientation::Axial => depth,
            Orientation::Coronal => rows,
            Orientation::Sagittal => cols,
        }
    }

    /// Extract the 2D cross-section at `index` along the given orientation,
    /// together with the in-plane (dy, dx) physical spacing of that plane.
    ///
    /// The index is clamped into bounds instead of failing; interactive
    /// callers routinely overshoot while the orientation changes.
    pub fn plane(
        &self,
        orientation: Orientation,
        index: usize,
    ) -> (ArrayView2<'_, f32>, (f32, f32)) {
        let (depth, rows, cols) = self.data.dim();
        let (dz, dy, dx) = self.spacing;
        match orientation {
            Orientation::Axial => {
                let i = index.min(depth - 1);
                (self.data.slice(s![i, .., ..]), (dy, dx))
            }
            Orientation::Coronal => {
                let i = index.min(rows - 1);
                (self.data.slice(s![.., i, ..]), (dz, dx))
            }
            Orientation::Sagittal => {
                let i = index.min(cols - 1);
                (self.data.slice(s![.., .., i]), (dz, dy))
            }
        }
    }

    /// The metadata-supplied display window, or one derived from the
    /// realized intensity range: center = (min + max) / 2,
    /// width = max(1, max - min).
    pub fn window_or_derived(&self) -> WindowLevel {
        if let Some(window) = self
            .default_window
            .filter(|w| w.center.is_finite() && w.width.is_finite() && w.width > 0.0)
        {
            return window;
        }

        let mut vmin = f32::INFINITY;
        let mut vmax = f32::NEG_INFINITY;
        for &v in self.data.iter() {
            if v.is_nan() {
                continue;
            }
            vmin = vmin.min(v);
            vmax = vmax.max(v);
        }
        if vmin > vmax {
            (vmin, vmax) = (0.0, 0.0);
        }
        WindowLevel {
            center: (vmin + vmax) / 2.0,
            width: (vmax - vmin).max(1.0),
        }
    }

    /// Full view pipeline for one request: extract the plane, apply the
    /// window, and resample to the plane's physical aspect ratio.
    pub fn render(
        &self,
        orientation: Orientation,
        index: usize,
        window: WindowLevel,
    ) -> Array2<u8> {
        let (slice, plane_spacing) = self.plane(orientation, index);
        let windowed = windowing::apply_window(slice, window.center, window.width, self.inverted);
        resample::resample_to_aspect(&windowed, plane_spacing)
    }
}

fn sanitize(spacing: f32) -> f32 {
    if spacing.is_finite() && spacing > 0.0 {
        spacing
    } else {
        1.0
    }
}

/// Convert an 8-bit grid into a grayscale image buffer for encoding/saving.
pub fn to_gray_image(grid: &Array2<u8>) -> Option<ImageBuffer<Luma<u8>, Vec<u8>>> {
    let (height, width) = grid.dim();
    let pixels: Vec<u8> = grid.iter().copied().collect();
    ImageBuffer::from_raw(width as u32, height as u32, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume() -> Volume {
        let data = Array3::from_shape_fn((10, 20, 30), |(z, y, x)| (z + y + x) as f32);
        Volume::new(data, (1.9, 0.7, 0.6), false, None)
    }

    #[test]
    fn plane_shapes_follow_orientation() {
        let v = volume();
        assert_eq!(v.plane(Orientation::Axial, 0).0.dim(), (20, 30));
        assert_eq!(v.plane(Orientation::Coronal, 0).0.dim(), (10, 30));
        assert_eq!(v.plane(Orientation::Sagittal, 0).0.dim(), (10, 20));
    }

    #[test]
    fn plane_spacing_follows_orientation() {
        let v = volume();
        assert_eq!(v.plane(Orientation::Axial, 0).1, (0.7, 0.6));
        assert_eq!(v.plane(Orientation::Coronal, 0).1, (1.9, 0.6));
        assert_eq!(v.plane(Orientation::Sagittal, 0).1, (1.9, 0.7));
    }

    #[test]
    fn out_of_bounds_index_clamps() {
        let v = volume();
        let (clamped, _) = v.plane(Orientation::Axial, 999);
        let (last, _) = v.plane(Orientation::Axial, 9);
        assert_eq!(clamped, last);
    }

    #[test]
    fn non_positive_spacing_falls_back_to_unit() {
        let data = Array3::zeros((2, 2, 2));
        let v = Volume::new(data, (0.0, -3.0, f32::NAN), false, None);
        assert_eq!(v.spacing(), (1.0, 1.0, 1.0));
    }

    #[test]
    fn derived_window_spans_intensity_range() {
        let v = volume();
        // intensities run 0 ..= 57
        let w = v.window_or_derived();
        assert_eq!(w.center, 28.5);
        assert_eq!(w.width, 57.0);
    }

    #[test]
    fn stored_window_wins_when_valid() {
        let data = Array3::zeros((1, 2, 2));
        let stored = WindowLevel {
            center: 40.0,
            width: 400.0,
        };
        let v = Volume::new(data, (1.0, 1.0, 1.0), false, Some(stored));
        assert_eq!(v.window_or_derived(), stored);

        let bad = WindowLevel {
            center: 40.0,
            width: 0.0,
        };
        let v = Volume::new(Array3::zeros((1, 2, 2)), (1.0, 1.0, 1.0), false, Some(bad));
        assert_eq!(
            v.window_or_derived(),
            WindowLevel {
                center: 0.0,
                width: 1.0
            }
        );
    }

    #[test]
    fn render_applies_aspect_correction() {
        let v = volume();
        let w = v.window_or_derived();
        // Sagittal plane is (10, 20) at (dy, dx) = (1.9, 0.7)
        let rendered = v.render(Orientation::Sagittal, 5, w);
        let expected_h = (10.0_f32 * (1.9 / 0.7)).round() as usize;
        assert_eq!(rendered.dim(), (expected_h, 20));
    }
}
