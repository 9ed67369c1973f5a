//! Common API utilities shared across versions

pub mod middleware;
pub mod utils;
