//! Adapter from `dicom-rs` objects to the decoder-neutral [`DecodedFrame`]
//! record consumed by the assembly pipeline.

use dicom::object::{FileDicomObject, InMemDicomObject};
use dicom::pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption};
use dicom_dictionary_std::tags;
use ndarray::{ArrayD, Axis};

use crate::frame::{DecodedFrame, WindowLevel};

type DicomObject = FileDicomObject<InMemDicomObject>;

/// Decode one DICOM object into a frame record.
///
/// Returns `None` when the object carries no decodable monochrome pixel
/// data. Every metadata read is an independent `Option` so a malformed tag
/// degrades that one field rather than rejecting the frame.
pub fn decode_frame(obj: &DicomObject) -> Option<DecodedFrame> {
    let pixels = decode_pixels(obj)?;
    Some(DecodedFrame {
        pixels,
        series_uid: string_tag(obj, tags::SERIES_INSTANCE_UID),
        position: position(obj),
        instance_number: obj
            .element(tags::INSTANCE_NUMBER)
            .ok()
            .and_then(|e| e.to_int::<i32>().ok()),
        pixel_spacing: pixel_spacing(obj),
        spacing_between_slices: float_tag(obj, tags::SPACING_BETWEEN_SLICES),
        slice_thickness: float_tag(obj, tags::SLICE_THICKNESS),
        rescale_slope: float_tag(obj, tags::RESCALE_SLOPE),
        rescale_intercept: float_tag(obj, tags::RESCALE_INTERCEPT),
        window: window_level(obj),
        inverted: is_inverted(obj),
    })
}

/// Raw stored samples, 2D for a single page or 3D (pages, rows, cols) for a
/// multi-frame object. LUTs are disabled: the pipeline applies the rescale
/// transform and windowing itself.
fn decode_pixels(obj: &DicomObject) -> Option<ArrayD<f32>> {
    let pixel_data = obj.decode_pixel_data().ok()?;
    let options = ConvertOptions::new()
        .with_modality_lut(ModalityLutOption::None)
        .with_voi_lut(VoiLutOption::Identity);
    // (frames, rows, cols, samples)
    let arr = pixel_data.to_ndarray_with_options::<f32>(&options).ok()?;
    if arr.ndim() != 4 || arr.shape()[3] != 1 {
        // color photometric interpretations are unsupported
        return None;
    }
    let arr = arr.index_axis_move(Axis(3), 0);
    if arr.shape()[0] == 1 {
        Some(arr.index_axis_move(Axis(0), 0).into_dyn())
    } else {
        Some(arr.into_dyn())
    }
}

fn string_tag(obj: &DicomObject, tag: dicom::core::Tag) -> Option<String> {
    obj.element(tag)
        .ok()
        .and_then(|e| e.to_str().ok())
        .map(|s| s.trim_end_matches('\0').trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn float_tag(obj: &DicomObject, tag: dicom::core::Tag) -> Option<f32> {
    obj.element(tag).ok().and_then(|e| e.to_float32().ok())
}

fn position(obj: &DicomObject) -> Option<[f32; 3]> {
    let values = obj
        .element(tags::IMAGE_POSITION_PATIENT)
        .ok()?
        .to_multi_float32()
        .ok()?;
    (values.len() >= 3).then(|| [values[0], values[1], values[2]])
}

fn pixel_spacing(obj: &DicomObject) -> Option<[f32; 2]> {
    let values = obj
        .element(tags::PIXEL_SPACING)
        .ok()?
        .to_multi_float32()
        .ok()?;
    (values.len() >= 2).then(|| [values[0], values[1]])
}

fn window_level(obj: &DicomObject) -> Option<WindowLevel> {
    // multi-valued window tags use the first entry
    let center = *obj
        .element(tags::WINDOW_CENTER)
        .ok()?
        .to_multi_float32()
        .ok()?
        .first()?;
    let width = *obj
        .element(tags::WINDOW_WIDTH)
        .ok()?
        .to_multi_float32()
        .ok()?
        .first()?;
    Some(WindowLevel { center, width })
}

fn is_inverted(obj: &DicomObject) -> bool {
    obj.element(tags::PHOTOMETRIC_INTERPRETATION)
        .ok()
        .and_then(|e| e.to_str().ok().map(|s| s.into_owned()))
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("MONOCHROME1"))
}
