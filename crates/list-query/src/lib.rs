//! Client-side list querying shared by every admin list view.
//!
//! `QueryState` holds what the user selected, `run_query` turns a cached
//! collection plus that state into one page, and `records` defines how each
//! dashboard record type answers tabs, search and filters.
pub mod engine;
pub mod query;
pub mod records;

pub use engine::{facet_options, run_query, FacetValue, Listable, QueryPage};
pub use query::{ItemsPerPage, QueryError, QueryState, ALL};
