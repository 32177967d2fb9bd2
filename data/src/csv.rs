//! Moving field snapshots to and from CSV files
//!
//! Each snapshot is a standalone file holding the coordinates and field value
//! of every grid point, one point per line, in (i, j, k) order. Data rows carry
//! a blank last column for compatibility with existing post-processing scripts.

use crate::{field::Field, grid::Grid, Point, Precision};
use ::csv::{
    QuoteStyle, ReaderBuilder, StringRecord, StringRecordsIntoIter, Terminator, WriterBuilder,
};
use log::{debug, info};
use std::{
    fmt::{self, Display},
    fs::{self, DirBuilder, File},
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Column names, written quoted on the first line of every snapshot file
pub const HEADER: [&str; 4] = ["X", "Y", "Z", "scalar_field"];

/// Snapshot directory used unless told otherwise
pub const DEFAULT_OUTPUT_DIR: &str = "standalone_results";

/// File name prefix of snapshot files, which is followed by the step number
pub const FILE_PREFIX: &str = "scalar_field_standalone_";

/// Last column of every data row, so that rows end with `, `
const TRAILING_FIELD: &str = " ";

/// Number of columns of a data row
const ROW_LEN: usize = HEADER.len() + 1;

/// Path of the snapshot taken at a certain simulation step
pub fn snapshot_path(output_dir: impl AsRef<Path>, step: usize) -> PathBuf {
    output_dir.as_ref().join(format!("{FILE_PREFIX}{step}.csv"))
}

/// Simulation steps of the snapshots found in a directory, in ascending order
pub fn snapshot_steps(output_dir: impl AsRef<Path>) -> Result<Vec<usize>> {
    let output_dir = output_dir.as_ref();
    let read_error = |source| SnapshotError::Read {
        path: output_dir.to_owned(),
        source,
    };
    let mut steps = Vec::new();
    for entry in fs::read_dir(output_dir).map_err(read_error)? {
        let file_name = entry.map_err(read_error)?.file_name();
        let step = file_name
            .to_str()
            .and_then(|name| name.strip_prefix(FILE_PREFIX))
            .and_then(|name| name.strip_suffix(".csv"))
            .and_then(|step| step.parse::<usize>().ok());
        steps.extend(step);
    }
    steps.sort_unstable();
    Ok(steps)
}

/// Errors that can occur while accessing snapshots
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Output directory could not be created
    #[error("failed to create output directory {path:?}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Snapshot file could not be created
    #[error("failed to write snapshot {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Snapshot file or directory could not be read
    #[error("failed to read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Snapshot records could not be encoded or decoded
    #[error("CSV error in snapshot {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: ::csv::Error,
    },

    /// Snapshot file does not follow the expected format
    #[error("malformed snapshot {path:?} at line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Grid and field do not cover the same points
    #[error("grid has shape {grid:?} but field has shape {field:?}")]
    ShapeMismatch { grid: [usize; 3], field: [usize; 3] },
}

/// Result type of snapshot I/O
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Textual rendering of floating-point numbers
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum FloatFormat {
    /// Shortest representation that parses back to the same number
    #[default]
    Shortest,

    /// Six significant digits, switching to exponent notation for very large
    /// or very small magnitudes, like a C `%g` conversion
    ///
    /// This is lossy, but yields files that can be diffed against the output
    /// of legacy tooling.
    General,
}
//
impl FloatFormat {
    /// Render a number according to this format
    pub fn display(self, value: Precision) -> impl Display {
        Formatted {
            format: self,
            value,
        }
    }
}

/// Number paired with its rendering format
struct Formatted {
    format: FloatFormat,
    value: Precision,
}
//
impl Display for Formatted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            FloatFormat::Shortest => write!(f, "{}", self.value),
            FloatFormat::General => write_general(f, self.value),
        }
    }
}

/// Significant digits of [`FloatFormat::General`]
const GENERAL_DIGITS: i32 = 6;

/// Write a number in the style of a C `%g` conversion
fn write_general(f: &mut fmt::Formatter<'_>, value: Precision) -> fmt::Result {
    if value.is_nan() {
        return f.write_str(if value.is_sign_negative() { "-nan" } else { "nan" });
    }
    if value.is_infinite() {
        return f.write_str(if value < 0.0 { "-inf" } else { "inf" });
    }
    if value == 0.0 {
        return f.write_str(if value.is_sign_negative() { "-0" } else { "0" });
    }

    // The decimal exponent after rounding decides between fixed and scientific
    let scientific = format!("{:.*e}", (GENERAL_DIGITS - 1) as usize, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return Err(fmt::Error);
    };
    let exponent = exponent.parse::<i32>().map_err(|_| fmt::Error)?;
    if (-4..GENERAL_DIGITS).contains(&exponent) {
        let decimals = (GENERAL_DIGITS - 1 - exponent) as usize;
        let fixed = format!("{value:.decimals$}");
        f.write_str(trim_fraction(&fixed))
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(
            f,
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    }
}

/// Drop trailing zeros of a fractional part, and the dot if nothing remains
fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Configuration of snapshot output
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Directory where snapshot files are written
    pub output_dir: PathBuf,

    /// Rendering of coordinates and field values
    pub float_format: FloatFormat,
}
//
impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            float_format: FloatFormat::default(),
        }
    }
}

/// Mechanism to write field snapshots into a directory
#[derive(Debug)]
pub struct Writer {
    /// Output configuration
    config: Config,

    /// Number of snapshots written so far
    num_written: usize,
}
//
impl Writer {
    /// Prepare to write snapshots, creating the output directory if needed
    pub fn create(config: Config) -> Result<Self> {
        create_output_dir(&config.output_dir)?;
        info!("Writing snapshots to {:?}", config.output_dir);
        Ok(Self {
            config,
            num_written: 0,
        })
    }

    /// Output configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of snapshots written so far
    pub fn num_written(&self) -> usize {
        self.num_written
    }

    /// Write the snapshot of a certain step, replacing any previous one
    ///
    /// Returns the path of the newly written file.
    pub fn write(&mut self, step: usize, grid: &Grid, field: &Field) -> Result<PathBuf> {
        if grid.shape() != field.shape() {
            return Err(SnapshotError::ShapeMismatch {
                grid: grid.shape(),
                field: field.shape(),
            });
        }
        let path = snapshot_path(&self.config.output_dir, step);
        let file = File::create(&path).map_err(|source| SnapshotError::Write {
            path: path.clone(),
            source,
        })?;
        write_rows(file, grid, field, self.config.float_format).map_err(|source| {
            SnapshotError::Csv {
                path: path.clone(),
                source,
            }
        })?;
        self.num_written += 1;
        debug!("Wrote snapshot of step {step} to {path:?}");
        Ok(path)
    }
}

/// Create the snapshot directory, doing nothing if it already exists
fn create_output_dir(path: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o777);
    }
    builder
        .create(path)
        .map_err(|source| SnapshotError::CreateDir {
            path: path.to_owned(),
            source,
        })
}

/// CSV writer configuration shared by the header and the data rows
fn writer_builder(quote_style: QuoteStyle) -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder
        .quote_style(quote_style)
        .terminator(Terminator::Any(b'\n'));
    builder
}

/// Write the header and one row per grid point
fn write_rows(
    mut out: impl io::Write,
    grid: &Grid,
    field: &Field,
    format: FloatFormat,
) -> ::csv::Result<()> {
    let mut header = writer_builder(QuoteStyle::Always).from_writer(&mut out);
    header.write_record(HEADER)?;
    header.flush()?;
    drop(header);

    // Rows are numbers and the blank trailing column, left unquoted
    let mut rows = writer_builder(QuoteStyle::Never).from_writer(out);
    for (&[x, y, z], &value) in grid.coordinates().iter().zip(field.values().iter()) {
        rows.write_record([
            format.display(x).to_string(),
            format.display(y).to_string(),
            format.display(z).to_string(),
            format.display(value).to_string(),
            TRAILING_FIELD.to_owned(),
        ])?;
    }
    rows.flush()?;
    Ok(())
}

/// Single data row of a snapshot file
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Row {
    /// Coordinates of the grid point
    pub point: Point,

    /// Field value at this point
    pub value: Precision,
}

/// Mechanism to read data rows back from a snapshot file
///
/// You can treat this reader as an iterator of rows.
pub struct Reader {
    /// Path of the file being read
    path: PathBuf,

    /// Remaining data records
    records: StringRecordsIntoIter<File>,
}
//
impl Reader {
    /// Open a snapshot file and check its header
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let file = File::open(&path).map_err(|source| SnapshotError::Read {
            path: path.clone(),
            source,
        })?;

        // Data rows have one more column than the header
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let header = reader.headers().map_err(|source| SnapshotError::Csv {
            path: path.clone(),
            source,
        })?;
        if !header.iter().eq(HEADER) {
            return Err(SnapshotError::Malformed {
                path,
                line: 1,
                reason: format!("expected header {HEADER:?}, found {header:?}"),
            });
        }
        Ok(Self {
            path,
            records: reader.into_records(),
        })
    }

    /// Read all remaining rows
    pub fn read_all(self) -> Result<Vec<Row>> {
        self.collect()
    }

    /// Decode a data record
    fn parse_row(&self, record: &StringRecord) -> Result<Row> {
        let line = record
            .position()
            .map_or(0, |position| position.line() as usize);
        let malformed = |reason: String| SnapshotError::Malformed {
            path: self.path.clone(),
            line,
            reason,
        };
        if record.len() != ROW_LEN {
            return Err(malformed(format!(
                "expected {ROW_LEN} columns, found {}",
                record.len()
            )));
        }
        if &record[ROW_LEN - 1] != TRAILING_FIELD {
            return Err(malformed(format!(
                "expected a blank last column, found {:?}",
                &record[ROW_LEN - 1]
            )));
        }
        let parse = |column: usize| {
            let text = &record[column];
            text.parse::<Precision>()
                .map_err(|e| malformed(format!("invalid number {text:?} ({e})")))
        };
        Ok(Row {
            point: [parse(0)?, parse(1)?, parse(2)?],
            value: parse(3)?,
        })
    }
}
//
impl Iterator for Reader {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.records.next()? {
            Ok(record) => self.parse_row(&record),
            Err(source) => Err(SnapshotError::Csv {
                path: self.path.clone(),
                source,
            }),
        };
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grid::Geometry, parameters::Parameters, test_utils::init_logger};

    /// Fresh scratch directory for a test
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("data-csv-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    /// First line of a snapshot file
    const HEADER_LINE: &str = "\"X\",\"Y\",\"Z\",\"scalar_field\"";

    fn general(value: Precision) -> String {
        FloatFormat::General.display(value).to_string()
    }

    #[test]
    fn general_format() {
        assert_eq!(general(0.0), "0");
        assert_eq!(general(-0.0), "-0");
        assert_eq!(general(100.0), "100");
        assert_eq!(general(0.1 * 3.0), "0.3");
        assert_eq!(general(0.5), "0.5");
        assert_eq!(general(18.350341907227405), "18.3503");
        assert_eq!(general(-2.5), "-2.5");
        assert_eq!(general(123456.0), "123456");
        assert_eq!(general(1234567.0), "1.23457e+06");
        assert_eq!(general(999999.5), "1e+06");
        assert_eq!(general(0.0001), "0.0001");
        assert_eq!(general(0.00001234), "1.234e-05");
        assert_eq!(general(1e-300), "1e-300");
        assert_eq!(general(f64::NAN), "nan");
        assert_eq!(general(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn shortest_format() {
        let shortest = |value: Precision| FloatFormat::Shortest.display(value).to_string();
        assert_eq!(shortest(0.0), "0");
        assert_eq!(shortest(100.0), "100");
        assert_eq!(shortest(0.1 * 3.0), "0.30000000000000004");
        assert_eq!(shortest(0.5), "0.5");
    }

    #[test]
    fn paths() {
        assert_eq!(
            snapshot_path("standalone_results", 40),
            Path::new("standalone_results/scalar_field_standalone_40.csv")
        );
    }

    #[test]
    fn write_snapshot() {
        init_logger();
        let dir = scratch_dir("write");
        let grid = Grid::new(Geometry::default()).unwrap();
        let field = Field::seed(&grid, &Parameters::default());
        let mut writer = Writer::create(Config {
            output_dir: dir.clone(),
            ..Default::default()
        })
        .unwrap();

        let path = writer.write(0, &grid, &field).unwrap();
        assert_eq!(path, dir.join("scalar_field_standalone_0.csv"));
        assert_eq!(writer.num_written(), 1);

        let contents = fs::read_to_string(&path).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 1331 + 1);
        assert_eq!(lines[0], HEADER_LINE);
        assert_eq!(lines[1], "0,0,0,0, ");
        assert_eq!(lines[1 + 5 * 11 + 5], "0,0.5,0.5,100, ");
        assert_eq!(lines[1331], "1,1,1,0, ");
        assert!(contents.ends_with(", \n"));

        // Same step again silently replaces the file
        writer.write(0, &grid, &Field::zeros(grid.shape())).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().nth(1 + 5 * 11 + 5), Some("0,0.5,0.5,0, "));
        assert_eq!(snapshot_steps(&dir).unwrap(), vec![0]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn general_snapshot_rows() {
        let dir = scratch_dir("general");
        let grid = Grid::new(Geometry::default()).unwrap();
        let mut writer = Writer::create(Config {
            output_dir: dir.clone(),
            float_format: FloatFormat::General,
        })
        .unwrap();
        let path = writer.write(7, &grid, &Field::zeros(grid.shape())).unwrap();
        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().nth(1 + 3), Some("0,0,0.3,0, "));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn shape_mismatch() {
        let dir = scratch_dir("mismatch");
        let grid = Grid::new(Geometry::default()).unwrap();
        let mut writer = Writer::create(Config {
            output_dir: dir.clone(),
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(
            writer.write(0, &grid, &Field::zeros([11, 11, 10])),
            Err(SnapshotError::ShapeMismatch {
                grid: [11, 11, 11],
                field: [11, 11, 10],
            })
        ));
        assert_eq!(writer.num_written(), 0);
        assert_eq!(snapshot_steps(&dir).unwrap(), Vec::<usize>::new());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn read_back() {
        let dir = scratch_dir("read");
        let grid = Grid::new(Geometry {
            shape: [3, 2, 2],
            ..Default::default()
        })
        .unwrap();
        let field = Field::seed(&grid, &Parameters::default());
        let mut writer = Writer::create(Config {
            output_dir: dir.clone(),
            ..Default::default()
        })
        .unwrap();
        let path = writer.write(20, &grid, &field).unwrap();

        let rows = Reader::open(&path).unwrap().read_all().unwrap();
        assert_eq!(rows.len(), grid.num_points());
        for ((row, point), value) in rows.iter().zip(grid.coordinates()).zip(field.values()) {
            assert_eq!(row.point, *point);
            assert_eq!(row.value, *value);
        }
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn malformed_files() {
        let dir = scratch_dir("malformed");
        fs::create_dir_all(&dir).unwrap();

        let no_header = dir.join("no_header.csv");
        fs::write(&no_header, "0,0,0,0, \n").unwrap();
        assert!(matches!(
            Reader::open(&no_header),
            Err(SnapshotError::Malformed { line: 1, .. })
        ));

        let bad_row = dir.join("bad_row.csv");
        fs::write(&bad_row, format!("{HEADER_LINE}\n0,0,0,0, \n0,0,zero, \n0,0,0,1,x\n")).unwrap();
        let mut reader = Reader::open(&bad_row).unwrap();
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next(),
            Some(Err(SnapshotError::Malformed { line: 3, .. }))
        ));
        assert!(matches!(
            reader.next(),
            Some(Err(SnapshotError::Malformed { line: 4, .. }))
        ));
        assert!(reader.next().is_none());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn snapshot_listing() {
        let dir = scratch_dir("listing");
        fs::create_dir_all(&dir).unwrap();
        for name in [
            "scalar_field_standalone_40.csv",
            "scalar_field_standalone_0.csv",
            "scalar_field_standalone_x.csv",
            "notes.txt",
        ] {
            fs::write(dir.join(name), "").unwrap();
        }
        assert_eq!(snapshot_steps(&dir).unwrap(), vec![0, 40]);
        fs::remove_dir_all(dir).unwrap();
    }
}
