//! Test helpers for abnav-player integration tests
//!
//! - MockPlayer: scriptable player that records every call
//! - RecordingDelegate: collects navigator notifications
//! - Sample publications

pub mod mock_player;
pub mod recording_delegate;

pub use mock_player::{MockPlayer, PlayerCall};
pub use recording_delegate::{Notification, RecordingDelegate};

use abnav_common::{Link, Metadata, Publication};
use url::Url;

pub const BASE_URL: &str = "https://example.com/book/";

/// Resolve `href` against the sample base URL
pub fn book_url(href: &str) -> Url {
    Url::parse(BASE_URL).unwrap().join(href).unwrap()
}

/// Three chapters: 100 s MP3, 60 s MP3, and one with no declared type or
/// duration
pub fn sample_publication() -> Publication {
    Publication::new(
        Metadata {
            title: "Sample Audiobook".to_string(),
            ..Metadata::default()
        },
        vec![
            Link::new("ch1.mp3")
                .with_type("audio/mpeg")
                .with_title("Chapter 1")
                .with_duration(100.0),
            Link::new("ch2.mp3")
                .with_type("audio/mpeg")
                .with_title("Chapter 2")
                .with_duration(60.0),
            Link::new("ch3.mp3"),
        ],
        Some(Url::parse(BASE_URL).unwrap()),
    )
}

/// Mock player knowing the durations the sample publication declares
pub fn sample_player() -> MockPlayer {
    let player = MockPlayer::new();
    player.register_duration(&book_url("ch1.mp3"), 100.0);
    player.register_duration(&book_url("ch2.mp3"), 60.0);
    player
}
