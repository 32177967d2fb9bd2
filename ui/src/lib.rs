//! This crate collects the command-line elements of the simulation that are
//! not specific to a single program: argument definitions, logging setup and
//! progress reporting.

#[cfg(feature = "simulation")]
use clap::Args;
#[cfg(feature = "simulation")]
use compute::SimulateBase;
#[cfg(feature = "simulation")]
use data::{
    grid::Geometry,
    parameters::{Parameters, SeedRadius},
    Point, Precision,
};
#[cfg(feature = "tui")]
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
#[cfg(feature = "tui")]
use log::LevelFilter;
#[cfg(feature = "tui")]
use std::time::Duration;
#[cfg(feature = "tui")]
use syslog::Facility;

/// CLI arguments describing the simulated domain and its physics
#[cfg(feature = "simulation")]
#[derive(Args)]
pub struct SharedArgs<Simulation: SimulateBase> {
    /// Origin of the domain, as comma-separated x,y,z coordinates
    #[arg(
        long,
        value_name = "X,Y,Z",
        value_delimiter = ',',
        num_args = 3,
        allow_negative_numbers = true
    )]
    pub origin: Option<Vec<Precision>>,

    /// Length of the domain along each axis, as comma-separated x,y,z values
    #[arg(long, value_name = "X,Y,Z", value_delimiter = ',', num_args = 3)]
    pub extent: Option<Vec<Precision>>,

    /// Number of grid points along the x axis
    #[arg(long, default_value_t = 11)]
    pub nx: usize,

    /// Number of grid points along the y axis
    #[arg(long, default_value_t = 11)]
    pub ny: usize,

    /// Number of grid points along the z axis
    #[arg(long, default_value_t = 11)]
    pub nz: usize,

    /// Fraction of the upwind difference applied on each step
    #[arg(long)]
    pub diffusion_rate: Option<Precision>,

    /// Peak value of the initial radial falloff
    #[arg(long)]
    pub amplitude: Option<Precision>,

    /// Normalization radius of the initial radial falloff
    #[arg(long, value_enum, default_value_t = SeedRadius::Transverse)]
    pub seed_radius: SeedRadius,

    /// Backend-specific CLI arguments
    #[command(flatten)]
    pub backend: Simulation::CliArgs,
}
//
#[cfg(feature = "simulation")]
impl<Simulation: SimulateBase> SharedArgs<Simulation> {
    /// Domain geometry, with defaults for the bounds that clap can't handle
    pub fn geometry(&self) -> Geometry {
        let default = Geometry::default();
        Geometry {
            origin: triplet(self.origin.as_deref(), default.origin),
            extent: triplet(self.extent.as_deref(), default.extent),
            shape: [self.nx, self.ny, self.nz],
        }
    }

    /// Simulation parameters, with defaults that clap can't handle
    pub fn parameters(&self) -> Parameters {
        let default = Parameters::default();
        Parameters {
            diffusion_rate: self.diffusion_rate.unwrap_or(default.diffusion_rate),
            amplitude: self.amplitude.unwrap_or(default.amplitude),
            seed_radius: self.seed_radius,
        }
    }
}

/// Point given as x,y,z on the command line, if any
#[cfg(feature = "simulation")]
fn triplet(values: Option<&[Precision]>, default: Point) -> Point {
    match values {
        Some(&[x, y, z]) => [x, y, z],
        _ => default,
    }
}

/// Enable logging to syslog, or to stderr if syslog is not reachable
#[cfg(feature = "tui")]
pub fn init_logging() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(error) = syslog::init(Facility::default(), level, None) {
        // No syslog daemon, e.g. in a container
        let _ = env_logger::Builder::from_default_env().try_init();
        log::warn!("Failed to initialize syslog ({error}), logging to stderr instead");
    }
}

/// Set up a progress bar over a certain number of simulation steps
#[cfg(feature = "tui")]
pub fn init_progress_reporting(message: &'static str, num_steps: usize) -> ProgressBar {
    let progress = ProgressBar::new(num_steps as u64)
        .with_message(message)
        .with_style(
            ProgressStyle::with_template("{msg} {pos}/{len} {wide_bar} {elapsed}/~{duration}")
                .expect("Failed to parse style"),
        )
        .with_finish(ProgressFinish::AndClear);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
