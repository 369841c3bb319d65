//! Vector retrieval

mod index;

pub use index::VectorIndex;
