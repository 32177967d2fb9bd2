//! Facilities that are specific to CPU implementations

use crate::{Simulate, SimulateBase, SimulateCreate};
use data::{field::Field, grid::Grid};
use log::trace;

/// Simplified version of Simulate that simulates a single time step at a time
///
/// If you implement this, then a [`Simulate`] implementation that loops over
/// the requested number of steps will be automatically provided.
pub trait SimulateStep: SimulateBase + SimulateCreate {
    /// Perform a single simulation time step, updating the field in place
    ///
    /// Implementations must check their preconditions before modifying the
    /// field, so that an error leaves it untouched.
    fn perform_step(&self, grid: &Grid, field: &mut Field) -> Result<(), Self::Error>;
}
//
impl<T: SimulateStep> Simulate for T {
    fn perform_steps(
        &self,
        grid: &Grid,
        field: &mut Field,
        steps: usize,
    ) -> Result<(), Self::Error> {
        for step in 0..steps {
            trace!("Performing step {}/{steps}", step + 1);
            self.perform_step(grid, field)?;
        }
        Ok(())
    }
}
