use std::path::PathBuf;

use dicom_mpr::{
    enums::Orientation,
    resample, volume, windowing,
    volume_loader::VolumeLoader,
};

fn main() {
    tracing_subscriber::fmt::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "dicom".to_owned());
    let vol = VolumeLoader::load_from_path(&PathBuf::from(path))
        .expect("should have loaded a DICOM series");
    let window = vol.window_or_derived();

    for (orientation, name) in [
        (Orientation::Axial, "axial"),
        (Orientation::Coronal, "coronal"),
        (Orientation::Sagittal, "sagittal"),
    ] {
        let mid = vol.axis_len(orientation) / 2;
        let grid = vol.render(orientation, mid, window);
        let image = volume::to_gray_image(&grid).expect("should have converted the rendered grid");
        image
            .save(format!("{name}.png"))
            .expect("should have saved the rendered view");
    }

    // letterboxed axial preview with the mid-sagittal marker line
    let (axial, spacing) = vol.plane(Orientation::Axial, vol.axis_len(Orientation::Axial) / 2);
    let windowed = windowing::apply_window(axial, window.center, window.width, vol.inverted());
    let preview = resample::fit_to_preview(
        &windowed,
        spacing,
        (220, 220),
        Some((Orientation::Sagittal, 0.5)),
    );
    volume::to_gray_image(&preview)
        .expect("should have converted the preview grid")
        .save("preview.png")
        .expect("should have saved the preview");
}
