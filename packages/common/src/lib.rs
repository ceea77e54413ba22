pub mod deeplink;
pub mod hunt;
pub mod known_hunts;
pub mod media;
pub mod storage;

pub use deeplink::DeepLink;
pub use hunt::{Clue, ClueUpdate, ClueView, Hunt, HuntLookup};
pub use known_hunts::KnownHuntSet;
pub use media::MediaType;
