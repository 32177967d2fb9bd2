//! Structured 3D grid on which the field lives

use crate::{array3, Point, Precision};
use log::debug;
use ndarray::{Array3, ArrayView3};
use thiserror::Error;

/// Axis-aligned box and the number of grid points used to discretize it
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Geometry {
    /// Coordinates of the first grid point
    pub origin: Point,

    /// Length of the domain along each axis
    pub extent: Point,

    /// Number of grid points along each axis, including both ends
    pub shape: [usize; 3],
}
//
impl Default for Geometry {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            extent: [1.0; 3],
            shape: [11; 3],
        }
    }
}
//
impl Geometry {
    /// Distance between two consecutive grid points along each axis
    pub fn spacing(&self) -> Point {
        array3(|axis| self.extent[axis] / (self.shape[axis] as Precision - 1.0))
    }

    /// Geometric center of the domain
    pub fn center(&self) -> Point {
        array3(|axis| self.origin[axis] + self.extent[axis] / 2.0)
    }

    /// Position of the tolerance plane, half a grid spacing into the domain
    ///
    /// Points whose x coordinate is at or below this value are seeded, and are
    /// left alone by the simulation. The others start at zero and evolve.
    pub fn tolerance(&self) -> Precision {
        self.spacing()[0] * 0.5
    }

    /// Total number of grid points
    pub fn num_points(&self) -> usize {
        self.shape.iter().product()
    }

    /// Check that this geometry can be discretized
    pub fn validate(&self) -> Result<(), GridError> {
        for axis in 0..3 {
            let points = self.shape[axis];
            if points < 2 {
                return Err(GridError::TooFewPoints { axis, points });
            }
            let (origin, extent) = (self.origin[axis], self.extent[axis]);
            if !(origin.is_finite() && extent.is_finite()) {
                return Err(GridError::NonFiniteBounds {
                    axis,
                    origin,
                    extent,
                });
            }
        }
        Ok(())
    }
}

/// Errors that can occur while setting up a grid
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GridError {
    /// Spacing is undefined with less than two points on an axis
    #[error("axis {axis} needs at least 2 grid points, got {points}")]
    TooFewPoints { axis: usize, points: usize },

    /// Coordinates would not be finite
    #[error("axis {axis} has non-finite bounds (origin={origin}, extent={extent})")]
    NonFiniteBounds {
        axis: usize,
        origin: Precision,
        extent: Precision,
    },
}

/// Structured grid with precomputed point coordinates
///
/// Coordinates are computed once on creation and never change afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    /// Discretized domain
    geometry: Geometry,

    /// Coordinates of every point, indexed by (i, j, k)
    coordinates: Array3<Point>,
}
//
impl Grid {
    /// Compute the point coordinates of a geometry
    pub fn new(geometry: Geometry) -> Result<Self, GridError> {
        geometry.validate()?;
        let spacing = geometry.spacing();
        let coordinates = Array3::from_shape_fn(geometry.shape, |(i, j, k)| {
            let index = [i, j, k];
            array3(|axis| geometry.origin[axis] + spacing[axis] * index[axis] as Precision)
        });
        debug!(
            "Set up a {:?} grid with spacing {spacing:?} and tolerance {}",
            geometry.shape,
            geometry.tolerance()
        );
        Ok(Self {
            geometry,
            coordinates,
        })
    }

    /// Discretized domain
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Number of points along each axis
    pub fn shape(&self) -> [usize; 3] {
        self.geometry.shape
    }

    /// Total number of grid points
    pub fn num_points(&self) -> usize {
        self.coordinates.len()
    }

    /// See [`Geometry::tolerance()`]
    pub fn tolerance(&self) -> Precision {
        self.geometry.tolerance()
    }

    /// Coordinates of every grid point
    pub fn coordinates(&self) -> ArrayView3<'_, Point> {
        self.coordinates.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_grid() {
        let grid = Grid::new(Geometry::default()).unwrap();
        assert_eq!(grid.shape(), [11, 11, 11]);
        assert_eq!(grid.num_points(), 1331);
        assert_eq!(grid.geometry().num_points(), 1331);
        assert_abs_diff_eq!(grid.tolerance(), 0.05, epsilon = 1e-15);
        assert_eq!(grid.geometry().center(), [0.5; 3]);
    }

    #[test]
    fn coordinates_follow_origin_and_spacing() {
        let geometry = Geometry {
            origin: [-1.0, 0.25, 3.0],
            extent: [2.0, 0.5, 7.0],
            shape: [5, 3, 8],
        };
        let grid = Grid::new(geometry).unwrap();
        for ((i, j, k), point) in grid.coordinates().indexed_iter() {
            let expected = [
                -1.0 + 2.0 / 4.0 * i as f64,
                0.25 + 0.5 / 2.0 * j as f64,
                3.0 + 7.0 / 7.0 * k as f64,
            ];
            for axis in 0..3 {
                assert_abs_diff_eq!(point[axis], expected[axis], epsilon = 1e-12);
            }
        }

        // The last point lands on the far corner of the domain
        let last = grid.coordinates()[[4, 2, 7]];
        assert_abs_diff_eq!(last[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(last[1], 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(last[2], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn central_plane_coordinates_are_exact() {
        let grid = Grid::new(Geometry::default()).unwrap();
        assert_eq!(grid.coordinates()[[0, 0, 0]], [0.0; 3]);
        assert_eq!(grid.coordinates()[[0, 5, 5]], [0.0, 0.5, 0.5]);
    }

    #[test]
    fn too_few_points() {
        let geometry = Geometry {
            shape: [11, 1, 11],
            ..Default::default()
        };
        assert_eq!(
            Grid::new(geometry),
            Err(GridError::TooFewPoints { axis: 1, points: 1 })
        );
    }

    #[test]
    fn non_finite_bounds() {
        let geometry = Geometry {
            extent: [1.0, 1.0, f64::INFINITY],
            ..Default::default()
        };
        assert!(matches!(
            Grid::new(geometry),
            Err(GridError::NonFiniteBounds { axis: 2, .. })
        ));
    }
}
