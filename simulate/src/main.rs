use clap::Parser;
use compute::{Simulate, SimulateCreate};
use compute_naive::Simulation;
use data::{
    csv::{self, FloatFormat, Writer},
    field::Field,
    grid::{Geometry, Grid},
    parameters::Parameters,
};
use eyre::{Result, WrapErr};
use indicatif::ProgressBar;
use log::info;
use std::{
    io::{self, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
};
use ui::SharedArgs;

/// Perform pseudo-diffusion on a 3D grid, writing CSV snapshots of the field
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Domain and physics arguments
    #[command(flatten)]
    shared: SharedArgs<Simulation>,

    /// Number of simulation steps
    #[arg(short = 'n', long, default_value_t = 200)]
    steps: usize,

    /// Number of simulation steps between two snapshots
    #[arg(short = 'i', long, default_value_t = NonZeroUsize::new(20).unwrap())]
    output_interval: NonZeroUsize,

    /// Directory where snapshots are written
    #[arg(short, long, default_value = csv::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Rendering of numbers in snapshots
    #[arg(long, value_enum, default_value_t = FloatFormat::Shortest)]
    float_format: FloatFormat,

    /// Read the last snapshot back and check it once the simulation is done
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    // Enable logging to syslog
    ui::init_logging();

    // Parse CLI arguments and handle clap-incompatible defaults
    let args = Args::parse();
    let geometry = args.shared.geometry();
    let params = args.shared.parameters();
    let schedule = Schedule {
        steps: args.steps,
        output_interval: args.output_interval,
    };
    info!("Simulating {schedule:?} on {geometry:?} with {params:?}");

    // Set up the simulation and write the initial snapshot
    let simulation = Simulation::new(params, args.shared.backend)?;
    let run = Run::initialize(
        simulation,
        geometry,
        &params,
        schedule,
        csv::Config {
            output_dir: args.output_dir,
            float_format: args.float_format,
        },
    )?;

    // Run the simulation
    let progress = ui::init_progress_reporting("Running simulation step", args.steps);
    let last_snapshot = run.execute(&mut io::stdout().lock(), &progress)?;
    progress.finish_and_clear();

    if args.verify {
        verify_snapshot(&last_snapshot, geometry.num_points())?;
    }
    Ok(())
}

/// When snapshots are taken
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct Schedule {
    /// Number of simulation steps
    steps: usize,

    /// Number of simulation steps between two snapshots
    output_interval: NonZeroUsize,
}
//
impl Schedule {
    /// Truth that a snapshot is taken after a certain step
    fn is_output_step(&self, step: usize) -> bool {
        step % self.output_interval.get() == 0
    }

    /// Steps after which a snapshot is taken, starting with the initial state
    #[cfg(test)]
    fn output_steps(&self) -> impl Iterator<Item = usize> {
        (0..=self.steps).step_by(self.output_interval.get())
    }
}

/// Initialized simulation, ready to run
struct Run<S: Simulate> {
    /// Compute backend
    simulation: S,

    /// Simulation grid
    grid: Grid,

    /// Evolving field
    field: Field,

    /// Snapshot output
    writer: Writer,

    /// When snapshots are taken
    schedule: Schedule,
}
//
impl<S: Simulate> Run<S> {
    /// Set up the grid and the initial field, then write the initial snapshot
    fn initialize(
        simulation: S,
        geometry: Geometry,
        params: &Parameters,
        schedule: Schedule,
        output: csv::Config,
    ) -> Result<Self> {
        let grid = Grid::new(geometry).wrap_err("Failed to set up simulation grid")?;
        let field = Field::seed(&grid, params);
        let mut writer = Writer::create(output).wrap_err("Failed to set up snapshot output")?;
        writer
            .write(0, &grid, &field)
            .wrap_err("Failed to write initial snapshot")?;
        Ok(Self {
            simulation,
            grid,
            field,
            writer,
            schedule,
        })
    }

    /// Perform every simulation step, taking snapshots on schedule
    ///
    /// Step announcements go to `console`. Returns the path of the last
    /// snapshot that was written.
    fn execute(mut self, console: &mut impl Write, progress: &ProgressBar) -> Result<PathBuf> {
        let mut last_snapshot = csv::snapshot_path(&self.writer.config().output_dir, 0);
        for step in 1..=self.schedule.steps {
            progress
                .suspend(|| -> io::Result<()> {
                    writeln!(console)?;
                    writeln!(console, "{{Coarse Domain}} {step} Step ")
                })
                .wrap_err("Failed to announce simulation step")?;

            self.simulation
                .perform_steps(&self.grid, &mut self.field, 1)
                .wrap_err_with(|| format!("Failed to perform simulation step {step}"))?;

            if self.schedule.is_output_step(step) {
                last_snapshot = self
                    .writer
                    .write(step, &self.grid, &self.field)
                    .wrap_err_with(|| format!("Failed to write snapshot of step {step}"))?;
            }
            progress.inc(1);
        }
        info!(
            "Simulation done, wrote {} snapshot(s)",
            self.writer.num_written()
        );
        Ok(last_snapshot)
    }
}

/// Check that a snapshot can be read back and has one row per grid point
fn verify_snapshot(path: &Path, num_points: usize) -> Result<()> {
    let rows = csv::Reader::open(path)?.read_all()?;
    eyre::ensure!(
        rows.len() == num_points,
        "Snapshot {path:?} has {} rows, expected {num_points}",
        rows.len()
    );
    info!("Verified snapshot {path:?}");
    Ok(())
}
