//! Common facilities shared by all compute backends

#[cfg(feature = "criterion")]
pub mod benchmark;
#[cfg(feature = "cpu")]
pub mod cpu;

use clap::Args;
use data::{field::Field, grid::Grid, parameters::Parameters};
use std::{error::Error, fmt::Debug};

/// Commonalities between all ways to set up a simulation
pub trait SimulateBase: Sized {
    /// Supplementary CLI arguments allowing fine-tuning of this backend
    ///
    /// To honor the principle of least surprise and make criterion
    /// microbenchmarks work smoothly, any argument you add must have a default
    /// value and should also be configurable through environment variables.
    type CliArgs: Args + Debug;

    /// Errors that can occur while advancing the simulation
    type Error: Error + Send + Sync + 'static;
}

/// Simulation setup
pub trait SimulateCreate: SimulateBase {
    /// Set up the simulation
    fn new(params: Parameters, args: Self::CliArgs) -> Result<Self, Self::Error>;
}

/// Simulation compute backend interface expected by the binaries
pub trait Simulate: SimulateBase + SimulateCreate {
    /// Perform `steps` simulation time steps on the field, in place
    ///
    /// The grid provides the point coordinates that decide which points are
    /// updated. On error, the field may have been advanced by some of the
    /// requested steps but never by part of a step.
    fn perform_steps(&self, grid: &Grid, field: &mut Field, steps: usize)
        -> Result<(), Self::Error>;
}

/// Placeholder for backends that don't have extra CLI arguments
#[derive(Args, Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct NoArgs {}
