//! API module containing all versioned API endpoints
//!
//! This module organizes API endpoints by version to support
//! backward compatibility and gradual migration.

pub mod common;
pub mod v1;
