use crate::decode;
use crate::frame::DecodedFrame;
use crate::series::{resolve_spacing, select_largest_series, sort_frames};
use crate::volume::Volume;

use dicom::object::open_file;
use ndarray::{Array2, Array3, Axis, Ix2, Ix3, s};
use rayon::prelude::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no usable frames with pixel data found")]
    NoUsableFrames,

    #[error("inconsistent frame dimensions within the series")]
    InconsistentFrameShape,

    #[error("unsupported pixel grid shape: {0:?}")]
    UnsupportedGridShape(Vec<usize>),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Assemble a volume from decoded frames.
    ///
    /// Frames without pixel content are dropped, the largest series is
    /// selected, its members are sorted into spatial order, and the rescaled
    /// pages are stacked along a new leading depth axis. Spacing, polarity
    /// and the default display window come from the series metadata.
    ///
    /// # Errors
    ///
    /// Returns an error when no usable frames remain, when in-plane
    /// dimensions differ within the series, or when a frame's grid is
    /// neither 2D nor 3D.
    pub fn assemble_series(frames: Vec<DecodedFrame>) -> Result<Volume, LoadError> {
        let frames: Vec<_> = frames
            .into_iter()
            .filter(DecodedFrame::has_pixels)
            .collect();
        if frames.is_empty() {
            return Err(LoadError::NoUsableFrames);
        }

        let (series_uid, mut series) = select_largest_series(frames);
        sort_frames(&mut series);
        debug!(series = %series_uid, frames = series.len(), "assembling volume");

        let spacing = resolve_spacing(&series);
        let first = &series[0];
        let inverted = first.inverted;
        let default_window = first
            .window
            .filter(|w| w.center.is_finite() && w.width.is_finite() && w.width > 0.0);

        // A single decoded unit carrying multiple pages is the whole volume.
        if series.len() == 1 && series[0].pixels.ndim() == 3 {
            let frame = series.remove(0);
            let shape = frame.pixels.shape().to_vec();
            let data = frame
                .into_rescaled_pixels()
                .into_dimensionality::<Ix3>()
                .map_err(|_| LoadError::UnsupportedGridShape(shape))?;
            return Ok(Volume::new(data, spacing, inverted, default_window));
        }

        let slices = series
            .into_par_iter()
            .map(Self::rescaled_page)
            .collect::<Result<Vec<Array2<f32>>, LoadError>>()?;

        Self::validate_dimensions(&slices)?;
        let data = Self::stack_slices(&slices);
        Ok(Volume::new(data, spacing, inverted, default_window))
    }

    /// Load a volume from a file or a directory.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Volume, LoadError> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::load_from_directory(path)
        } else {
            Self::load_from_file(path)
        }
    }

    /// Load a volume from a single file; a multi-frame file becomes the
    /// full depth axis, a single-frame file a depth-1 volume.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Volume, LoadError> {
        let obj = open_file(path.as_ref())?;
        let frame = decode::decode_frame(&obj).ok_or(LoadError::NoUsableFrames)?;
        Self::assemble_series(vec![frame])
    }

    /// Load a volume from a directory tree of DICOM files.
    ///
    /// Files that fail to open or carry no pixel data are skipped, matching
    /// the reality of mixed exports (DICOMDIR indexes, reports, localizers).
    pub fn load_from_directory(path: impl AsRef<Path>) -> Result<Volume, LoadError> {
        let mut paths = Vec::new();
        Self::collect_candidates(path.as_ref(), &mut paths)?;
        paths.sort();

        let mut frames = Vec::new();
        for path in &paths {
            match open_file(path) {
                Ok(obj) => match decode::decode_frame(&obj) {
                    Some(frame) => frames.push(frame),
                    None => debug!(path = %path.display(), "skipping file without usable pixel data"),
                },
                Err(error) => debug!(path = %path.display(), %error, "skipping unreadable file"),
            }
        }
        Self::assemble_series(frames)
    }

    fn collect_candidates(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::collect_candidates(&path, out)?;
            } else if Self::looks_like_dicom(&path) {
                out.push(path);
            }
        }
        Ok(())
    }

    fn looks_like_dicom(path: &Path) -> bool {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) => ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom"),
            // extension-less files are common in exported studies
            None => true,
        }
    }

    /// Rescale one series member and reduce it to a single 2D page.
    fn rescaled_page(frame: DecodedFrame) -> Result<Array2<f32>, LoadError> {
        let shape = frame.pixels.shape().to_vec();
        let rescaled = frame.into_rescaled_pixels();
        match rescaled.ndim() {
            2 => rescaled
                .into_dimensionality::<Ix2>()
                .map_err(|_| LoadError::UnsupportedGridShape(shape)),
            3 => {
                // A stray multi-page unit inside a per-file series would
                // duplicate depth positions; keep only its first page.
                if shape[0] > 1 {
                    warn!(
                        pages = shape[0],
                        "multi-page frame in a per-file series; keeping first page"
                    );
                }
                rescaled
                    .index_axis_move(Axis(0), 0)
                    .into_dimensionality::<Ix2>()
                    .map_err(|_| LoadError::UnsupportedGridShape(shape))
            }
            _ => Err(LoadError::UnsupportedGridShape(shape)),
        }
    }

    fn validate_dimensions(slices: &[Array2<f32>]) -> Result<(), LoadError> {
        let first_dim = slices[0].dim();
        if slices.iter().any(|slice| slice.dim() != first_dim) {
            return Err(LoadError::InconsistentFrameShape);
        }
        Ok(())
    }

    fn stack_slices(slices: &[Array2<f32>]) -> Array3<f32> {
        let (height, width) = slices[0].dim();
        let depth = slices.len();
        let mut data = Array3::<f32>::zeros((depth, height, width));

        for (i, slice) in slices.iter().enumerate() {
            data.slice_mut(s![i, .., ..]).assign(slice);
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Orientation;
    use crate::frame::WindowLevel;
    use ndarray::{Array2, Array3};

    fn frame_at(z: f32, rows: usize, cols: usize) -> DecodedFrame {
        let mut f = DecodedFrame::new(
            Array2::from_shape_fn((rows, cols), |(r, c)| (r + c) as f32).into_dyn(),
        );
        f.series_uid = Some("series-1".to_owned());
        f.position = Some([0.0, 0.0, z]);
        f
    }

    #[test]
    fn assembles_ordered_series_end_to_end() {
        let frames: Vec<_> = [2.0, 0.0, 3.0, 1.0]
            .iter()
            .map(|&z| frame_at(z, 128, 128))
            .collect();
        let volume = VolumeLoader::assemble_series(frames).expect("assembly should succeed");

        assert_eq!(volume.dim(), (4, 128, 128));
        assert_eq!(volume.spacing(), (1.0, 1.0, 1.0));
        assert!(volume.default_window().is_none());

        // intensities run 0 ..= 254
        let derived = volume.window_or_derived();
        assert_eq!(derived, WindowLevel { center: 127.0, width: 254.0 });
    }

    #[test]
    fn empty_input_is_no_usable_frames() {
        assert!(matches!(
            VolumeLoader::assemble_series(Vec::new()),
            Err(LoadError::NoUsableFrames)
        ));

        let empty = DecodedFrame::new(Array2::<f32>::zeros((0, 0)).into_dyn());
        assert!(matches!(
            VolumeLoader::assemble_series(vec![empty]),
            Err(LoadError::NoUsableFrames)
        ));
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let frames = vec![frame_at(0.0, 64, 64), frame_at(1.0, 32, 64)];
        assert!(matches!(
            VolumeLoader::assemble_series(frames),
            Err(LoadError::InconsistentFrameShape)
        ));
    }

    #[test]
    fn unsupported_dimensionality_is_rejected() {
        let mut f = frame_at(0.0, 4, 4);
        f.pixels = ndarray::ArrayD::zeros(ndarray::IxDyn(&[2, 2, 2, 2]));
        let other = frame_at(1.0, 4, 4);
        assert!(matches!(
            VolumeLoader::assemble_series(vec![f, other]),
            Err(LoadError::UnsupportedGridShape(_))
        ));
    }

    #[test]
    fn largest_series_wins() {
        let mut frames = Vec::new();
        for z in 0..3 {
            let mut f = frame_at(z as f32, 16, 16);
            f.series_uid = Some("a".to_owned());
            frames.push(f);
        }
        for z in 0..5 {
            let mut f = frame_at(z as f32, 16, 16);
            f.series_uid = Some("b".to_owned());
            frames.push(f);
        }
        let volume = VolumeLoader::assemble_series(frames).expect("assembly should succeed");
        assert_eq!(volume.axis_len(Orientation::Axial), 5);
    }

    #[test]
    fn single_multi_page_unit_keeps_all_pages() {
        let mut f = frame_at(0.0, 0, 0);
        f.pixels = Array3::from_shape_fn((6, 32, 32), |(z, r, c)| (z + r + c) as f32).into_dyn();
        f.rescale_slope = Some(2.0);
        let volume = VolumeLoader::assemble_series(vec![f]).expect("assembly should succeed");
        assert_eq!(volume.dim(), (6, 32, 32));
        assert_eq!(volume.data()[[5, 0, 0]], 10.0);
    }

    #[test]
    fn stray_multi_page_member_keeps_first_page_only() {
        let mut multi = frame_at(0.0, 0, 0);
        multi.pixels = Array3::from_elem((3, 16, 16), 9.0_f32).into_dyn();
        multi.series_uid = Some("series-1".to_owned());
        multi.position = Some([0.0, 0.0, 0.0]);
        let frames = vec![multi, frame_at(1.0, 16, 16)];

        let volume = VolumeLoader::assemble_series(frames).expect("assembly should succeed");
        assert_eq!(volume.dim(), (2, 16, 16));
        assert_eq!(volume.data()[[0, 0, 0]], 9.0);
    }

    #[test]
    fn rescale_applies_before_stacking() {
        let mut frames: Vec<_> = [0.0, 1.0].iter().map(|&z| frame_at(z, 8, 8)).collect();
        for f in &mut frames {
            f.rescale_slope = Some(2.0);
            f.rescale_intercept = Some(-10.0);
        }
        let volume = VolumeLoader::assemble_series(frames).expect("assembly should succeed");
        // raw (r + c) = 14 at the far corner -> 2 * 14 - 10
        assert_eq!(volume.data()[[0, 7, 7]], 18.0);
    }

    #[test]
    fn window_propagates_from_first_frame() {
        let mut frames: Vec<_> = [0.0, 1.0].iter().map(|&z| frame_at(z, 8, 8)).collect();
        frames[0].window = Some(WindowLevel { center: 40.0, width: 400.0 });
        let volume = VolumeLoader::assemble_series(frames).expect("assembly should succeed");
        assert_eq!(
            volume.default_window(),
            Some(WindowLevel { center: 40.0, width: 400.0 })
        );

        let mut frames: Vec<_> = [0.0, 1.0].iter().map(|&z| frame_at(z, 8, 8)).collect();
        frames[0].window = Some(WindowLevel { center: 40.0, width: -5.0 });
        let volume = VolumeLoader::assemble_series(frames).expect("assembly should succeed");
        assert!(volume.default_window().is_none());
    }
}
