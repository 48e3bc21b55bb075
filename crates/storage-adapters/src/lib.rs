//! # storage-adapters
//!
//! Gateway adapters implementing the `RowStore` and `MediaStore` ports:
//! the hosted backend over HTTP (feature `gateway-http`) and an in-memory
//! backend that is always compiled.

pub mod memory;

#[cfg(feature = "gateway-http")]
pub mod http;

pub use memory::{MemoryGateway, StoredObject};

#[cfg(feature = "gateway-http")]
pub use http::{GatewaySettings, HttpGateway};
