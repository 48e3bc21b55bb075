//! quire/crates/domains/src/lib.rs
//!
//! Domain models, error types and port definitions shared by every Quire
//! crate. No I/O happens here.

pub mod envelope;
pub mod error;
pub mod models;
pub mod query;
pub mod traits;

// Re-exporting for easier access in other crates
pub use envelope::*;
pub use error::*;
pub use models::*;
pub use query::*;
pub use traits::*;
