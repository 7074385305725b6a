//! Query construction and page decoding.
//!
//! The pipeline for one list request:
//!
//! - [`QuerySpec`] - what page/filter/sort the grid wants
//! - [`build`] - normalizes a spec into [`QueryParams`] for transport, splitting
//!   off [`Refinement`]s the backend cannot evaluate
//! - [`Page`] - the decoded response with its [`PaginationMetadata`]
//! - [`refine`] - applies the refinements to the fetched rows

mod builder;
mod envelope;
mod order;
mod page;
mod refine;
mod spec;

pub use builder::*;
pub(crate) use envelope::decode_page;
pub use order::Direction;
pub use order::Sort;
pub use page::Page;
pub use page::PaginationMetadata;
pub use refine::Refined;
pub use refine::TotalScope;
pub use refine::refine;
pub use spec::DateRange;
pub use spec::QuerySpec;
