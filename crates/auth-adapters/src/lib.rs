//! # auth-adapters
//!
//! Implementations of the `AuthProvider` port.
//!
//! - [`PasswordAuth`]: email/password sign-in against the hosted backend's
//!   token endpoint.
//! - [`MemoryAuth`]: fixed accounts for tests and offline runs.
//!
//! With `auth-jwt` enabled, [`claims::read_claims`] fills in the user id and
//! expiry from the access token itself when the token response omits them.

#[cfg(feature = "auth-jwt")]
pub mod claims;
pub mod memory;
pub mod password;

pub use memory::MemoryAuth;
pub use password::PasswordAuth;
