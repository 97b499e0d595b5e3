//! Filters

mod boxf; // box is reserved keyword
mod catmull_rom;
mod disk;
mod gaussian;
mod sinc;
mod triangle;

// Re-export.
pub use boxf::*;
pub use catmull_rom::*;
pub use disk::*;
pub use gaussian::*;
pub use sinc::*;
pub use triangle::*;

use texcore::filter::*;

/// Returns the filter function for a filter type.
///
/// * `filter_type` - The filter type.
pub fn filter_for(filter_type: FilterType) -> &'static dyn Filter {
    match filter_type {
        FilterType::Box => &BoxFilter,
        FilterType::Triangle => &TriangleFilter,
        FilterType::Gaussian => &GaussianFilter,
        FilterType::CatmullRom => &CatmullRomFilter,
        FilterType::Sinc => &SincFilter,
        FilterType::Disk => &DiskFilter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [FilterType; 6] = [
        FilterType::Box,
        FilterType::Triangle,
        FilterType::Gaussian,
        FilterType::CatmullRom,
        FilterType::Sinc,
        FilterType::Disk,
    ];

    #[test]
    fn every_filter_peaks_at_centre() {
        for t in ALL.iter() {
            let f = filter_for(*t);
            assert!(f.evaluate(0.0, 0.0, 2.0, 2.0) > 0.0, "{t}");
        }
    }

    proptest! {
        #[test]
        fn zero_outside_support(
            x in 1.01..10.0f32,
            y in -0.9..0.9f32,
            w in 0.5..8.0f32,
        ) {
            for t in ALL.iter() {
                let f = filter_for(*t);
                let x = x * 0.5 * w;
                prop_assert_eq!(f.evaluate(x, y * 0.5 * w, w, w), 0.0);
                prop_assert_eq!(f.evaluate(y * 0.5 * w, -x, w, w), 0.0);
            }
        }

        #[test]
        fn symmetric(x in -4.0..4.0f32, y in -4.0..4.0f32, w in 0.5..8.0f32) {
            for t in ALL.iter() {
                let f = filter_for(*t);
                prop_assert_eq!(f.evaluate(x, y, w, w), f.evaluate(-x, -y, w, w));
            }
        }
    }
}
