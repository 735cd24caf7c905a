//! Test Helper Utilities
//!
//! Shared world for fabricator integration tests

pub mod world;

// Re-export commonly used items
pub use world::World;
