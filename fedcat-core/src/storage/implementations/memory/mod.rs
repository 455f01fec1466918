//! In-memory storage backend

mod graph;

pub use graph::{MemoryGraph, MemoryStore};
