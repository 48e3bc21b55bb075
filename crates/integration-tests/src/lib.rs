//! Shared fixtures for the end-to-end tests: seeded in-memory gateways and
//! deterministic clocks.

pub mod fixtures;
