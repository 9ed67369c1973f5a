//! Database-backed record types used by the V1 API and the sync pipeline.

pub mod channels;
pub mod comments;
pub mod sync_jobs;
pub mod videos;
