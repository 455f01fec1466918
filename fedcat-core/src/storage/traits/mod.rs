//! Storage traits

mod graph;

pub use graph::{CatalogStore, Graph};
pub(crate) use graph::check_endpoints;
