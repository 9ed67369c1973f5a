pub mod video_sync;
pub mod youtube;
