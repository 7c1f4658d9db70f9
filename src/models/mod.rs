pub mod channel;
pub mod user;
pub mod video;

pub use channel::{Channel, ChannelChanges, ChannelCreate, ChannelUpdate};
pub use user::{LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, User};
pub use video::{Video, VideoChanges, VideoCreate, VideoFilter, VideoListQuery, VideoUpdate};
