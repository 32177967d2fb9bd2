//! Naive implementation of the pseudo-diffusion simulation
//!
//! Every point beyond the tolerance plane relaxes towards its upwind neighbor
//! along the x axis. The grid is swept in place in ascending (i, j, k) order,
//! so each point sees the value that its upwind neighbor received during the
//! same step. This is a Gauss-Seidel style sweep, and switching to a
//! double-buffered update would change the results.

use compute::{cpu::SimulateStep, NoArgs, SimulateBase, SimulateCreate};
use data::{field::Field, grid::Grid, parameters::Parameters};
use log::debug;
use ndarray::Axis;
use thiserror::Error;

/// Pseudo-diffusion simulation
#[derive(Debug)]
pub struct Simulation {
    /// Simulation parameters
    params: Parameters,
}
//
impl SimulateBase for Simulation {
    type CliArgs = NoArgs;

    type Error = StepError;
}
//
impl SimulateCreate for Simulation {
    fn new(params: Parameters, _args: NoArgs) -> Result<Self, StepError> {
        debug!("Using naive backend with {params:?}");
        Ok(Self { params })
    }
}
//
impl SimulateStep for Simulation {
    fn perform_step(&self, grid: &Grid, field: &mut Field) -> Result<(), StepError> {
        // Check the inputs before touching any value
        let shape = grid.shape();
        if field.shape() != shape {
            return Err(StepError::ShapeMismatch {
                grid: shape,
                field: field.shape(),
            });
        }
        let tolerance = grid.tolerance();
        let coordinates = grid.coordinates();
        if let Some(((j, k), _)) = coordinates
            .index_axis(Axis(0), 0)
            .indexed_iter()
            .find(|(_, point)| point[0] > tolerance)
        {
            return Err(StepError::MissingUpwindNeighbor { j, k });
        }

        // Sweep x planes in ascending order, each plane reading the freshly
        // updated values of the previous one
        let rate = self.params.diffusion_rate;
        let mut values = field.values_mut();
        for i in 1..shape[0] {
            let (upwind, downwind) = values.view_mut().split_at(Axis(0), i);
            let upwind = upwind.index_axis_move(Axis(0), i - 1);
            let current = downwind.index_axis_move(Axis(0), 0);
            ndarray::azip!((value in current, &previous in &upwind, point in coordinates.index_axis(Axis(0), i)) {
                if point[0] > tolerance {
                    *value += rate * (previous - *value);
                }
            });
        }
        Ok(())
    }
}

/// Errors that can occur during a simulation step
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StepError {
    /// A point of the first x plane lies beyond the tolerance plane
    ///
    /// It would need a value from the (nonexistent) plane before it.
    #[error("point (0, {j}, {k}) lies beyond the tolerance plane but has no upwind neighbor")]
    MissingUpwindNeighbor { j: usize, k: usize },

    /// Field was not set up for this grid
    #[error("field shape {field:?} does not match grid shape {grid:?}")]
    ShapeMismatch { grid: [usize; 3], field: [usize; 3] },
}
