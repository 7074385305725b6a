//! Grid synchronization library
//!
//! Keeps a paginated, filterable, sortable admin grid in sync with a REST
//! backend that owns the canonical pagination metadata, and runs inline edits,
//! single deletes and bulk deletes against the same dataset.

pub mod api;
pub mod error;
pub mod grid;
pub mod model;
pub mod rate_limit;
pub mod validate;

mod client;

pub use client::*;
pub use grid::GridConfig;
pub use grid::GridController;
