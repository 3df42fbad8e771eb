//! Epsilon-aware geometric predicates.
//!
//! All functions in this module take explicit tolerance parameters or
//! scale their epsilon with the input magnitudes.

mod predicates;

pub use predicates::{line_line_intersection_t, orient2d, proper_crossing, Orientation};
