//! rusty-gallery/crates/domains/src/lib.rs
//!
//! Models, error taxonomy and port traits shared by every Rusty-Gallery crate.

pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
