//! Operators over runtime values
//!
//! [`safe_math`] is the checked integer layer; [`binary`] builds the
//! language's arithmetic and comparison operators on top of it.

pub mod binary;
pub mod safe_math;

pub use binary::{
    add, compare, divide, greater_equal, greater_than, int_divide, less_equal, less_than,
    multiply, negate, pow, remainder, subtract,
};
