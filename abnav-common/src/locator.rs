//! Locators: addresses of a position inside a publication
//!
//! Audio positions are carried two ways:
//! - `progression`: fraction (0..=1) of the resource duration
//! - a `t=<seconds>` fragment, e.g. `t=754.25`
//!
//! When a duration is known, progression wins. Otherwise the first fragment
//! holding a time is used.

use crate::publication::Link;
use serde::{Deserialize, Serialize};

/// Locations of a locator inside its resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locations {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progression: Option<f64>,

    /// Progression across the whole publication (never computed for audio yet)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_progression: Option<f64>,
}

/// A position in a publication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locator {
    pub href: String,

    #[serde(rename = "type")]
    pub media_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub locations: Locations,
}

impl Locator {
    pub fn new(href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            media_type: media_type.into(),
            title: None,
            locations: Locations::default(),
        }
    }

    /// Locator pointing at the start of a linked resource
    pub fn from_link(link: &Link) -> Self {
        Self {
            href: link.href.clone(),
            media_type: link.media_type.clone().unwrap_or_default(),
            title: link.title.clone(),
            locations: Locations::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.locations.fragments.push(fragment.into());
        self
    }

    /// Append a `t=<seconds>` fragment
    pub fn with_time(self, seconds: f64) -> Self {
        self.with_fragment(time_fragment(seconds))
    }

    pub fn with_progression(mut self, progression: f64) -> Self {
        self.locations.progression = Some(progression);
        self
    }

    /// Time offset in seconds targeted by this locator
    ///
    /// Progression is used when both it and `duration` are available;
    /// otherwise the first `t=` fragment. `None` when neither resolves.
    pub fn time(&self, duration: Option<f64>) -> Option<f64> {
        if let (Some(progression), Some(duration)) = (self.locations.progression, duration) {
            return Some(progression * duration);
        }

        self.locations
            .fragments
            .iter()
            .find_map(|fragment| parse_time_fragment(fragment))
    }
}

/// Encode a time offset as a locator fragment
pub fn time_fragment(seconds: f64) -> String {
    format!("t={}", seconds)
}

/// Extract the first `t=<number>` from a fragment
///
/// The number is an unsigned decimal: digits with an optional `.digits` part.
/// The key may appear anywhere in the fragment (`a=b&t=12`).
pub fn parse_time_fragment(fragment: &str) -> Option<f64> {
    let mut rest = fragment;
    while let Some(index) = rest.find("t=") {
        let candidate = &rest[index + 2..];
        if let Some(number) = leading_decimal(candidate) {
            return number.parse().ok();
        }
        rest = candidate;
    }
    None
}

fn leading_decimal(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let whole = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if whole == 0 {
        return None;
    }

    let mut end = whole;
    if bytes.get(end) == Some(&b'.') {
        let fraction = bytes[end + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
        if fraction > 0 {
            end += 1 + fraction;
        }
    }
    Some(&text[..end])
}
