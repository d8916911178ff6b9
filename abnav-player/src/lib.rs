//! abnav-player library
//!
//! Plays an audiobook's reading order through a media player:
//! - [`player`]: the player abstraction and an in-process simulated player
//! - [`navigator`]: the audiobook navigator and its observer traits
//! - [`session`]: a clocked playback session for hosts without a real player

pub mod error;
pub mod navigator;
pub mod player;
pub mod session;

pub use error::{Error, Result};
pub use navigator::{
    AudiobookNavigator, AudiobookNavigatorDelegate, MediaNavigator, MediaNavigatorDelegate,
    Navigator, NavigatorDelegate, NavigatorOptions,
};
pub use player::{MediaPlayer, SimulatedPlayer};
pub use session::{PlaybackSession, SessionOptions};
