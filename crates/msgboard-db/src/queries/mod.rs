//! Database query implementations.

pub mod messages;
