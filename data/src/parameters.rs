//! Computation parameters

use crate::{Point, Precision};

/// Computation parameters
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Parameters {
    /// Fraction of the upwind difference that is applied on each step
    pub diffusion_rate: Precision,

    /// Peak value of the radial falloff used to seed the field
    pub amplitude: Precision,

    /// Normalization radius of the radial falloff
    pub seed_radius: SeedRadius,
}
//
impl Default for Parameters {
    fn default() -> Self {
        Self {
            diffusion_rate: 0.25,
            amplitude: 100.0,
            seed_radius: SeedRadius::default(),
        }
    }
}

/// How the normalization radius of the seed pattern is measured
///
/// The seed falloff itself is always measured in the (y, z) plane. This only
/// selects which components enter the origin-to-center reference distance.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SeedRadius {
    /// Origin-to-center distance in the (y, z) plane
    ///
    /// The seeded corner of the domain then ends up at exactly zero.
    #[default]
    Transverse,

    /// Full 3D origin-to-center distance, as legacy snapshot files used
    Diagonal,
}
//
impl SeedRadius {
    /// Reference distance between the domain origin and its center
    pub fn reach(self, origin: Point, center: Point) -> Precision {
        let squared = |axis: usize| (origin[axis] - center[axis]).powi(2);
        match self {
            Self::Transverse => (squared(1) + squared(2)).sqrt(),
            Self::Diagonal => (squared(0) + squared(1) + squared(2)).sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reach_of_unit_cube() {
        let origin = [0.0; 3];
        let center = [0.5; 3];
        assert_abs_diff_eq!(
            SeedRadius::Transverse.reach(origin, center),
            0.5f64.sqrt(),
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            SeedRadius::Diagonal.reach(origin, center),
            0.75f64.sqrt(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn transverse_reach_ignores_x() {
        let center = [0.5, 0.5, 0.5];
        assert_eq!(
            SeedRadius::Transverse.reach([-7.0, 0.0, 0.0], center),
            SeedRadius::Transverse.reach([0.0, 0.0, 0.0], center)
        );
    }
}
