//! Error types

mod api;
mod field;
mod grid;
mod validation;

pub use api::*;
pub use field::*;
pub use grid::*;
pub use validation::*;
