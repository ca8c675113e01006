use std::cmp::Ordering;

use crate::frame::DecodedFrame;

/// Grouping key for frames that carry no series identity at all.
const UNKNOWN_SERIES: &str = "unknown-series";

/// Group frames by series identity and return the largest group together
/// with its key. Ties resolve to the first-encountered series so selection
/// stays deterministic for a given input order.
pub(crate) fn select_largest_series(frames: Vec<DecodedFrame>) -> (String, Vec<DecodedFrame>) {
    let mut groups: Vec<(String, Vec<DecodedFrame>)> = Vec::new();
    for frame in frames {
        let key = frame
            .series_uid
            .clone()
            .unwrap_or_else(|| UNKNOWN_SERIES.to_owned());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(frame),
            None => groups.push((key, vec![frame])),
        }
    }

    let mut best = 0;
    for (i, (_, members)) in groups.iter().enumerate() {
        if members.len() > groups[best].1.len() {
            best = i;
        }
    }
    groups.swap_remove(best)
}

/// Sort frames into spatial order by their per-frame sort key.
pub(crate) fn sort_frames(frames: &mut [DecodedFrame]) {
    frames.sort_by(|a, b| {
        a.sort_key()
            .partial_cmp(&b.sort_key())
            .unwrap_or(Ordering::Equal)
    });
}

/// Resolve the (depth, row, col) voxel spacing in mm for an ordered series.
///
/// In-plane spacing comes from the first frame's pixel-spacing field. Depth
/// spacing tries, in order: the explicit inter-slice spacing, the slice
/// thickness, the median gap between consecutive depth positions, then 1.0.
/// The median is deliberate: a single missing slice doubles one gap, which
/// would skew a mean-based estimate but leaves the median untouched.
pub(crate) fn resolve_spacing(series: &[DecodedFrame]) -> (f32, f32, f32) {
    let first = &series[0];

    let [row, col] = first
        .pixel_spacing
        .filter(|s| s.iter().all(|v| v.is_finite() && *v > 0.0))
        .unwrap_or([1.0, 1.0]);

    let depth = first
        .spacing_between_slices
        .and_then(positive)
        .or_else(|| first.slice_thickness.and_then(positive))
        .or_else(|| median_depth_gap(series))
        .unwrap_or(1.0);

    (depth, row, col)
}

fn positive(value: f32) -> Option<f32> {
    (value.is_finite() && value > 0.0).then_some(value)
}

fn median_depth_gap(series: &[DecodedFrame]) -> Option<f32> {
    let mut positions: Vec<f32> = series.iter().filter_map(DecodedFrame::depth_position).collect();
    if positions.len() < 2 {
        return None;
    }
    positions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut gaps: Vec<f32> = positions.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    gaps.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = gaps.len() / 2;
    let median = if gaps.len() % 2 == 1 {
        gaps[mid]
    } else {
        (gaps[mid - 1] + gaps[mid]) / 2.0
    };
    positive(median)
}
