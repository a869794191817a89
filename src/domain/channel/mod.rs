pub mod entity;

pub use entity::{is_valid_channel_id, Channel, ChannelMetadata};
