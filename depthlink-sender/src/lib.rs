//! depthlink sender binary internals.

pub mod config;
pub mod sensor;
pub mod session;
