//! Image reference parsing and normalization.
//!
//! Parses references of the form `[registry[:port]/]repository[:tag][@digest]`:
//! - `nginx`
//! - `nginx:1.25`
//! - `bitnami/redis:7.2`
//! - `myregistry.io:5000/team/app:v2`
//! - `localhost/app@sha256:abc...`
//!
//! `:` and `/` are both overloaded (registry port vs. tag, registry host vs.
//! repository path), so the parser works in a fixed order: digest first, then
//! registry, then tag.
//!
//! Normalization never invents a registry or a `library/` namespace; the only
//! default it applies is the `latest` tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analyzer::images::types::ImageError;

/// Tag applied when a reference has neither tag nor digest.
pub const DEFAULT_TAG: &str = "latest";

/// How a parsed reference is turned back into a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizeMode {
    /// `:tag` when a tag exists, else `@digest`, else `:latest`.
    #[default]
    Canonical,
    /// `@digest` when a digest exists, else as `Canonical`.
    DigestPinned,
    /// Components exactly as written, no defaults.
    Raw,
}

impl NormalizeMode {
    /// Parse from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "canonical" | "normalized" => Some(Self::Canonical),
            "digest" | "digest-pinned" => Some(Self::DigestPinned),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }
}

/// A parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    /// Registry host with optional port, only when written explicitly.
    pub registry: Option<String>,
    pub repository: String,
    pub tag: Option<String>,
    /// Algorithm-prefixed digest such as `sha256:...`.
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference string.
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(ImageError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(ImageError::Whitespace(s.to_string()));
        }

        // Digest: everything after the last '@'
        let (name, digest) = match s.rsplit_once('@') {
            Some((_, "")) => return Err(ImageError::EmptyDigest(s.to_string())),
            Some((name, digest)) => (name, Some(digest.to_string())),
            None => (s, None),
        };

        let (registry, remainder) = split_registry(name);
        if let Some(registry) = registry.filter(|r| !is_valid_registry(r)) {
            return Err(ImageError::InvalidRegistry(
                s.to_string(),
                registry.to_string(),
            ));
        }

        // A colon only starts a tag when no '/' follows it
        let (repository, tag) = match remainder.rsplit_once(':') {
            Some((_, tag)) if tag.contains('/') => (remainder, None),
            Some((_, "")) => return Err(ImageError::EmptyTag(s.to_string())),
            Some((repository, tag)) => (repository, Some(tag.to_string())),
            None => (remainder, None),
        };

        if repository.is_empty() {
            return Err(ImageError::EmptyRepository(s.to_string()));
        }
        if !is_valid_repository(repository) {
            return Err(ImageError::InvalidRepository(
                s.to_string(),
                repository.to_string(),
            ));
        }

        Ok(Self {
            registry: registry.map(str::to_string),
            repository: repository.to_string(),
            tag,
            digest,
        })
    }

    /// Render the reference in the canonical form.
    pub fn canonical(&self) -> String {
        self.render(NormalizeMode::Canonical)
    }

    /// Render the reference according to `mode`.
    pub fn render(&self, mode: NormalizeMode) -> String {
        let mut out = String::new();
        if let Some(registry) = &self.registry {
            out.push_str(registry);
            out.push('/');
        }
        out.push_str(&self.repository);

        let tag = self.tag.as_deref().filter(|t| !t.is_empty());
        let digest = self.digest.as_deref().filter(|d| !d.is_empty());

        match (mode, tag, digest) {
            (NormalizeMode::Raw, tag, digest) => {
                if let Some(tag) = tag {
                    out.push(':');
                    out.push_str(tag);
                }
                if let Some(digest) = digest {
                    out.push('@');
                    out.push_str(digest);
                }
            }
            (NormalizeMode::DigestPinned, _, Some(digest)) => {
                out.push('@');
                out.push_str(digest);
            }
            (_, Some(tag), _) => {
                out.push(':');
                out.push_str(tag);
            }
            (_, None, Some(digest)) => {
                out.push('@');
                out.push_str(digest);
            }
            (_, None, None) => {
                out.push(':');
                out.push_str(DEFAULT_TAG);
            }
        }

        out
    }

}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl FromStr for ImageReference {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse `image` and render it according to `mode`.
pub fn normalize(image: &str, mode: NormalizeMode) -> Result<String, ImageError> {
    ImageReference::parse(image).map(|reference| reference.render(mode))
}

/// Split off the first path segment when it names a registry host.
fn split_registry(name: &str) -> (Option<&str>, &str) {
    match name.split_once('/') {
        Some((first, rest)) if is_registry_host(first) => (Some(first), rest),
        _ => (None, name),
    }
}

/// `.` (domain), `:` (port) or `localhost` mark a registry host.
fn is_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

/// A host, optionally followed by a numeric port.
fn is_valid_registry(registry: &str) -> bool {
    if registry.starts_with('[') && registry.ends_with(']') {
        return true;
    }
    match registry.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
        }
        None => true,
    }
}

fn is_valid_repository(repository: &str) -> bool {
    !repository.contains([':', '@'])
        && !repository.starts_with('/')
        && !repository.ends_with('/')
        && !repository.contains("//")
}
