//! Publication model: metadata, links and the reading order
//!
//! Only the subset of a Readium Web Publication Manifest that audiobook
//! navigation needs is modelled here.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};
use url::Url;

/// A link to a publication resource (reading-order entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,

    /// MIME type of the linked resource
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Declared duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Relations (`"self"`, `"cover"`, ...). Accepts a string or an array.
    #[serde(
        default,
        deserialize_with = "deserialize_rels",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub rel: Vec<String>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            media_type: None,
            title: None,
            duration: None,
            rel: Vec::new(),
        }
    }

    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn has_rel(&self, rel: &str) -> bool {
        self.rel.iter().any(|r| r == rel)
    }
}

fn deserialize_rels<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Rels {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Rels::deserialize(deserializer)? {
        Rels::One(rel) => vec![rel],
        Rels::Many(rels) => rels,
    })
}

/// Publication metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Total duration in seconds, as declared by the manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// An audiobook publication
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(default)]
    pub reading_order: Vec<Link>,

    /// Base URL used to resolve relative hrefs
    #[serde(skip)]
    base_url: Option<Url>,
}

impl Publication {
    pub fn new(metadata: Metadata, reading_order: Vec<Link>, base_url: Option<Url>) -> Self {
        Self {
            metadata,
            links: Vec::new(),
            reading_order,
            base_url,
        }
    }

    /// Parse a JSON manifest
    ///
    /// The base URL comes from an absolute `self` link when the manifest has
    /// one, otherwise `fallback_base_url` is used.
    pub fn from_manifest_json(json: &str, fallback_base_url: Option<Url>) -> Result<Self> {
        let mut publication: Publication = serde_json::from_str(json)?;

        let self_url = publication
            .links
            .iter()
            .find(|link| link.has_rel("self"))
            .and_then(|link| Url::parse(&link.href).ok());

        publication.base_url = self_url.or(fallback_base_url);
        debug!(
            "Parsed manifest '{}' with {} reading order entries",
            publication.metadata.title,
            publication.reading_order.len()
        );
        Ok(publication)
    }

    /// Load a manifest from disk, resolving hrefs relative to its directory
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let absolute = path.canonicalize()?;
        let directory = absolute
            .parent()
            .ok_or_else(|| Error::InvalidInput(format!("Manifest has no parent directory: {:?}", path)))?;

        let base_url = match Url::from_directory_path(directory) {
            Ok(url) => Some(url),
            Err(()) => {
                warn!("Cannot build a base URL from {:?}, relative hrefs will not resolve", directory);
                None
            }
        };

        Self::from_manifest_json(&json, base_url)
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Index of the first reading-order link whose href equals `href`
    pub fn index_of_href(&self, href: &str) -> Option<usize> {
        self.reading_order.iter().position(|link| link.href == href)
    }

    /// Resolve `href` against the base URL
    ///
    /// Without a base URL only absolute hrefs resolve.
    pub fn resolve_href(&self, href: &str) -> Option<Url> {
        match &self.base_url {
            Some(base) => base.join(href).ok(),
            None => Url::parse(href).ok(),
        }
    }

    /// Sum of the declared reading-order durations, if every entry declares one
    pub fn total_duration(&self) -> Option<f64> {
        self.reading_order
            .iter()
            .map(|link| link.duration)
            .sum::<Option<f64>>()
    }
}
