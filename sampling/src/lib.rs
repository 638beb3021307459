//! Deterministic sampling of residue vectors for tests and benchmarks.
pub mod source;

pub use source::Source;
