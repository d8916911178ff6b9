//! # abnav Common Library
//!
//! Shared code for the audiobook navigator crates:
//! - Publication model (reading order, base URL resolution)
//! - Locators and the `t=<seconds>` time fragment
//! - Playback state and navigator event types
//! - Configuration loading
//! - Human-readable time formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod locator;
pub mod publication;

pub use error::{Error, Result};
pub use events::{MediaPlaybackInfo, NavigatorEvent, PlaybackState};
pub use locator::{Locations, Locator};
pub use publication::{Link, Metadata, Publication};
