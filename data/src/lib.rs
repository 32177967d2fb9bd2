//! Data formats used by the pseudo-diffusion simulation

pub mod csv;
pub mod field;
pub mod grid;
pub mod parameters;

/// Computation precision
pub type Precision = f64;

/// Coordinates of a point in space
pub type Point = [Precision; 3];

/// Build a 3D array from a function of the axis index
///
/// Shorthand for `std::array::from_fn` that makes the intent of per-axis
/// computations more obvious.
#[inline]
pub fn array3<T>(f: impl FnMut(usize) -> T) -> [T; 3] {
    std::array::from_fn(f)
}
