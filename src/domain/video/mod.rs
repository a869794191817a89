pub mod entity;
pub mod invariants;

pub use entity::{Video, VideoMetadata};
pub use invariants::{is_valid_video_id, validate_video};
