//! Scalar field carried by the grid points

use crate::{grid::Grid, parameters::Parameters, Point, Precision};
use log::debug;
use ndarray::{Array3, ArrayView3, ArrayViewMut3};

/// Scalar value at every point of a grid, indexed by (i, j, k)
#[derive(Clone, Debug, PartialEq)]
pub struct Field(Array3<Precision>);
//
impl Field {
    /// Set up an all-zeros field
    pub fn zeros(shape: [usize; 3]) -> Self {
        Self(Array3::zeros(shape))
    }

    /// Wrap existing values
    pub fn from_values(values: Array3<Precision>) -> Self {
        Self(values)
    }

    /// Set up the initial field
    ///
    /// Points of the tolerance plane receive a radial falloff that peaks at
    /// `params.amplitude` on the (y, z) projection of the domain center. All
    /// other points start at zero.
    ///
    /// A degenerate domain where the seed radius is zero yields non-finite
    /// values on the tolerance plane. This is not guarded against.
    pub fn seed(grid: &Grid, params: &Parameters) -> Self {
        let geometry = grid.geometry();
        let center = geometry.center();
        let r_max = params.seed_radius.reach(geometry.origin, center);
        let tolerance = grid.tolerance();
        let amplitude = params.amplitude;
        debug!("Seeding field with amplitude {amplitude} and radius {r_max}");
        Self(grid.coordinates().map(|point| {
            if point[0] <= tolerance {
                let r = transverse_distance(point, &center);
                amplitude * (r_max - r) / r_max
            } else {
                0.0
            }
        }))
    }

    /// Number of points along each axis
    pub fn shape(&self) -> [usize; 3] {
        let (nx, ny, nz) = self.0.dim();
        [nx, ny, nz]
    }

    /// Read access to the values
    pub fn values(&self) -> ArrayView3<'_, Precision> {
        self.0.view()
    }

    /// Write access to the values
    pub fn values_mut(&mut self) -> ArrayViewMut3<'_, Precision> {
        self.0.view_mut()
    }
}

/// Distance between two points, ignoring their x coordinate
fn transverse_distance(point: &Point, center: &Point) -> Precision {
    ((point[1] - center[1]).powi(2) + (point[2] - center[2]).powi(2)).sqrt()
}
