//! The grid controller and the state it owns.
//!
//! - [`GridController`] - runs fetches and mutations against a backend
//! - [`PaginationStore`] - server-confirmed paging
//! - [`SelectionSet`] - ids picked for bulk operations
//! - [`EditState`] / [`DeleteState`] - per-row mutation state machines
//! - [`GridView`] - the snapshot handed to the presentation layer

mod config;
mod controller;
mod mutation;
mod pagination;
mod selection;
mod view;

pub use config::GridConfig;
pub use controller::*;
pub use mutation::*;
pub use pagination::PaginationStore;
pub use selection::SelectionSet;
pub use view::*;
