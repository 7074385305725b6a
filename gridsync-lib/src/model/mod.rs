//! Typed models

mod actor;
mod patch;
mod row;
mod row_serde;

pub use actor::*;
pub use patch::*;
pub use row::*;
