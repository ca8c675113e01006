//! # DICOM-MPR library
//!
//! This crate reconstructs a 3D image volume from a DICOM series and derives
//! correctly-proportioned, window-levelled 2D views along the three
//! orthogonal axes:
//!  - Axial
//!  - Coronal
//!  - Sagittal
//!
//! Volumes can be assembled from decoder-supplied [`DecodedFrame`] records or
//! loaded directly from a file or directory through the `dicom-rs`
//! ecosystem. Loading groups frames by Series Instance UID, keeps the
//! largest series, orders slices by Image Position (Patient) with an
//! Instance Number fallback, and resolves physical voxel spacing from the
//! metadata or from the slice positions themselves. Incomplete metadata
//! degrades to documented defaults instead of failing the load.
//!
//! Extracted planes are mapped to 8-bit with a window center/width
//! (including MONOCHROME1 inversion) and resampled so anisotropic voxels
//! display with correct physical proportions; a letterboxed preview mode
//! with a cross-section marker line is available for thumbnail views.
//!
//! # Examples
//!
//! Load a series from the dicom/ directory and save the mid-volume sagittal
//! view:
//!
//! ```no_run
//! # use dicom_mpr::{enums::Orientation, volume, volume_loader::VolumeLoader};
//! # use std::path::PathBuf;
//! let vol = VolumeLoader::load_from_path(&PathBuf::from("dicom"))
//!     .expect("should have loaded a DICOM series");
//! let window = vol.window_or_derived();
//! let grid = vol.render(
//!     Orientation::Sagittal,
//!     vol.axis_len(Orientation::Sagittal) / 2,
//!     window,
//! );
//! let image = volume::to_gray_image(&grid).expect("should have converted the rendered grid");
//! image.save("sagittal.png");
//! ```
//!
//! [`DecodedFrame`]: crate::frame::DecodedFrame

pub mod decode;
pub mod enums;
pub mod frame;
mod interpolator;
pub mod resample;
mod series;
pub mod volume;
pub mod volume_loader;
pub mod windowing;
