//! Backend operations

mod backend;
mod execute;
pub mod query;

pub use backend::*;
