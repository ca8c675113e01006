/// One of the three axis-aligned viewing directions through a volume.
///
/// The volume is stored as (depth, rows, cols); Axial slices across the
/// depth axis, Coronal across the row axis, Sagittal across the column axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Axial,
    Coronal,
    Sagittal,
}
