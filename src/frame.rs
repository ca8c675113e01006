use ndarray::ArrayD;

/// A display window: the intensity range `[center - width/2, center + width/2]`
/// is mapped linearly onto the full 8-bit display range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLevel {
    pub center: f32,
    pub width: f32,
}

/// One decoded cross-section as supplied by the file/metadata decoder.
///
/// `pixels` holds the raw stored samples (2D for a single page, 3D for a
/// multi-frame unit); the rescale slope/intercept have not been applied yet.
/// Every metadata field is optional because real-world inputs are frequently
/// only partially populated; each downstream resolver has a documented
/// fallback instead of failing the load.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub pixels: ArrayD<f32>,
    pub series_uid: Option<String>,
    /// 3D spatial position (x, y, z) in mm; the z component orders slices.
    pub position: Option<[f32; 3]>,
    pub instance_number: Option<i32>,
    /// In-plane physical spacing (row, col) in mm.
    pub pixel_spacing: Option<[f32; 2]>,
    pub spacing_between_slices: Option<f32>,
    pub slice_thickness: Option<f32>,
    pub rescale_slope: Option<f32>,
    pub rescale_intercept: Option<f32>,
    pub window: Option<WindowLevel>,
    /// True for MONOCHROME1-style sources (low raw values render bright).
    pub inverted: bool,
}

impl DecodedFrame {
    /// Create a frame with the given raw samples and no metadata.
    pub fn new(pixels: ArrayD<f32>) -> Self {
        Self {
            pixels,
            series_uid: None,
            position: None,
            instance_number: None,
            pixel_spacing: None,
            spacing_between_slices: None,
            slice_thickness: None,
            rescale_slope: None,
            rescale_intercept: None,
            window: None,
            inverted: false,
        }
    }

    pub fn has_pixels(&self) -> bool {
        !self.pixels.is_empty()
    }

    pub fn depth_position(&self) -> Option<f32> {
        self.position.map(|p| p[2]).filter(|z| z.is_finite())
    }

    /// Spatial sort key: depth position if present, else the instance
    /// number, else 0.0. Missing or unparseable fields fall through to the
    /// next rule so a partially tagged series still orders usably.
    pub fn sort_key(&self) -> f32 {
        self.depth_position()
            .or_else(|| self.instance_number.map(|n| n as f32))
            .unwrap_or(0.0)
    }

    /// Effective (slope, intercept), defaulting to the identity transform.
    pub fn rescale(&self) -> (f32, f32) {
        let slope = self.rescale_slope.filter(|s| s.is_finite()).unwrap_or(1.0);
        let intercept = self
            .rescale_intercept
            .filter(|i| i.is_finite())
            .unwrap_or(0.0);
        (slope, intercept)
    }

    /// Consume the frame and return its samples with the rescale transform
    /// applied, converting stored values into modality intensity units.
    pub fn into_rescaled_pixels(self) -> ArrayD<f32> {
        let (slope, intercept) = self.rescale();
        if slope == 1.0 && intercept == 0.0 {
            return self.pixels;
        }
        self.pixels.mapv_into(|v| v.mul_add(slope, intercept))
    }
}
