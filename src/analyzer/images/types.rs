//! Core types for image discovery.
//!
//! - `TreeKind` / `TreeOrigin` - where a configuration tree came from
//! - `ImageCandidate` - one occurrence of an image field in a tree
//! - `ImageError` - why an image string could not be parsed
//! - `DiscoveryWarning` - a non-fatal problem recorded during discovery
//! - `DiscoveryOptions` / `Discovery` - input knobs and final result

use std::fmt;

use thiserror::Error;

use crate::analyzer::images::parser::reference::NormalizeMode;

/// Default bound on tree nesting before a tree is abandoned.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Which kind of configuration tree is being walked.
///
/// Both kinds are walked the same way; the kind only labels diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeKind {
    /// A document from the rendered manifest stream.
    Manifest,
    /// The merged values tree.
    Values,
}

impl TreeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::Values => "values",
        }
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies a single tree in a discovery batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOrigin {
    pub kind: TreeKind,
    /// 1-based position of the document in the manifest stream.
    pub document: Option<usize>,
    /// Template path from Helm's `# Source:` comment, when present.
    pub source: Option<String>,
}

impl TreeOrigin {
    pub fn manifest(document: usize, source: Option<String>) -> Self {
        Self {
            kind: TreeKind::Manifest,
            document: Some(document),
            source,
        }
    }

    pub fn values() -> Self {
        Self {
            kind: TreeKind::Values,
            document: None,
            source: None,
        }
    }
}

impl fmt::Display for TreeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.document, &self.source) {
            (TreeKind::Manifest, Some(doc), Some(source)) => {
                write!(f, "manifest document {} ({})", doc, source)
            }
            (TreeKind::Manifest, Some(doc), None) => write!(f, "manifest document {}", doc),
            (TreeKind::Manifest, None, _) => write!(f, "manifest"),
            (TreeKind::Values, _, _) => write!(f, "values tree"),
        }
    }
}

/// Sibling image fields found on one mapping node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredImage {
    pub registry: Option<String>,
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl StructuredImage {
    /// Assemble the fields into `[registry/]repository[:tag][@digest]`.
    pub fn to_image_string(&self) -> String {
        let mut image = String::new();
        if let Some(registry) = &self.registry {
            image.push_str(registry.trim_end_matches('/'));
            image.push('/');
        }
        image.push_str(&self.repository);
        if let Some(tag) = &self.tag {
            image.push(':');
            image.push_str(tag);
        }
        if let Some(digest) = &self.digest {
            image.push('@');
            image.push_str(digest);
        }
        image
    }
}

/// An image occurrence discovered while walking a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCandidate {
    /// A string under a key literally named `image`.
    Raw { path: String, value: String },
    /// A node carrying `repository`/`tag`/`digest`/`registry` siblings.
    Structured { path: String, image: StructuredImage },
}

impl ImageCandidate {
    /// Dotted location of the candidate inside its tree, e.g. `spec.containers[0].image`.
    pub fn path(&self) -> &str {
        match self {
            Self::Raw { path, .. } | Self::Structured { path, .. } => path,
        }
    }

    /// The candidate as a single image string, ready for parsing.
    pub fn to_image_string(&self) -> String {
        match self {
            Self::Raw { value, .. } => value.clone(),
            Self::Structured { image, .. } => image.to_image_string(),
        }
    }
}

/// Image string parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("image reference is empty")]
    Empty,

    #[error("image reference '{0}' contains whitespace")]
    Whitespace(String),

    #[error("image reference '{0}' has an empty repository")]
    EmptyRepository(String),

    #[error("image reference '{0}' has an invalid repository '{1}'")]
    InvalidRepository(String, String),

    #[error("image reference '{0}' has an invalid registry '{1}'")]
    InvalidRegistry(String, String),

    #[error("image reference '{0}' ends with ':' but has no tag")]
    EmptyTag(String),

    #[error("image reference '{0}' ends with '@' but has no digest")]
    EmptyDigest(String),
}

/// The walker gave up on a tree nested deeper than the configured maximum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("nesting deeper than {max_depth} levels at '{path}'")]
pub struct DepthLimitExceeded {
    pub path: String,
    pub max_depth: usize,
}

/// Non-fatal problems recorded while discovering images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryWarning {
    /// A manifest segment was not a parseable YAML document; it was skipped.
    #[error("skipped document {document} at line {line}: {message}")]
    StructuralParse {
        document: usize,
        line: usize,
        message: String,
    },

    /// An image candidate could not be parsed; it was dropped.
    #[error("{origin}: dropped image at '{path}': {error}")]
    Format {
        origin: String,
        path: String,
        error: ImageError,
    },

    /// A tree was too deeply nested; all of its candidates were abandoned.
    #[error("{origin}: abandoned tree: {error}")]
    DepthLimitExceeded {
        origin: String,
        error: DepthLimitExceeded,
    },
}

/// Knobs for a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Also walk the values tree, for charts that only template images via helpers.
    pub include_values_tree: bool,
    pub mode: NormalizeMode,
    pub max_depth: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            include_values_tree: true,
            mode: NormalizeMode::Canonical,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DiscoveryOptions {
    pub fn with_values_tree(mut self, include: bool) -> Self {
        self.include_values_tree = include;
        self
    }

    pub fn with_mode(mut self, mode: NormalizeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Result of a discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Deduplicated images, sorted ascending.
    pub images: Vec<String>,
    pub warnings: Vec<DiscoveryWarning>,
    /// Number of manifest documents that parsed successfully.
    pub documents: usize,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
