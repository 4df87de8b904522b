//! Container image discovery for rendered Helm charts.
//!
//! Given the output of `helm template` and the merged values tree, finds every
//! field that denotes a container image and returns a sorted, deduplicated
//! list of normalized references.
//!
//! # Example
//!
//! ```rust
//! use chart_image_scanner::analyzer::images::discover_images;
//!
//! let manifests = r#"
//! ---
//! # Source: web/templates/deployment.yaml
//! apiVersion: apps/v1
//! kind: Deployment
//! spec:
//!   template:
//!     spec:
//!       containers:
//!         - name: web
//!           image: nginx
//! "#;
//! let values: serde_yaml::Value = serde_yaml::from_str("cache:\n  image:\n    repository: redis\n    tag: \"7\"\n").unwrap();
//!
//! let images = discover_images(manifests, &values, true);
//! assert_eq!(images, vec!["nginx:latest", "redis:7"]);
//! ```
//!
//! # Pipeline
//!
//! | Stage | Module |
//! |-------|--------|
//! | Split the stream into documents | [`parser::yaml`] |
//! | Find image fields in each tree | [`walk`] |
//! | Parse and normalize each reference | [`parser::reference`] |
//! | Deduplicate and sort | [`collect`] |
//!
//! No stage is fatal: malformed documents, malformed image strings and
//! over-deep trees are skipped and reported as [`DiscoveryWarning`]s.

pub mod collect;
pub mod formatter;
pub mod parser;
pub mod types;
pub mod walk;

pub use collect::ImageCollector;
pub use formatter::{OutputFormat, format_result, format_result_to_string};
pub use parser::{ImageReference, NormalizeMode, normalize};
pub use types::{
    DEFAULT_MAX_DEPTH, Discovery, DiscoveryOptions, DiscoveryWarning, ImageCandidate, ImageError,
    StructuredImage, TreeKind, TreeOrigin,
};
pub use walk::{ImageFields, image_fields};

use serde_yaml::Value;

/// Discover images in a rendered manifest stream and, optionally, the values tree.
pub fn discover(manifests: &str, values: &Value, options: &DiscoveryOptions) -> Discovery {
    let split = parser::split_documents(manifests);
    let mut collector = ImageCollector::new(options.mode, options.max_depth);

    for warning in split.warnings {
        collector.record(warning);
    }

    for document in &split.documents {
        let origin = TreeOrigin::manifest(document.index, document.source.clone());
        collector.collect_tree(&document.tree, &origin);
    }

    if options.include_values_tree {
        collector.collect_tree(values, &TreeOrigin::values());
    }

    let discovery = collector.finish(split.documents.len());
    log::info!(
        "Processed {} documents, found {} unique images ({} warnings)",
        discovery.documents,
        discovery.images.len(),
        discovery.warnings.len()
    );
    discovery
}

/// Sorted, deduplicated canonical images; warnings are only logged.
pub fn discover_images(manifests: &str, values: &Value, include_values_tree: bool) -> Vec<String> {
    let options = DiscoveryOptions::default().with_values_tree(include_values_tree);
    discover(manifests, values, &options).images
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFESTS: &str = r#"---
# Source: app/templates/deployment.yaml
apiVersion: apps/v1
kind: Deployment
metadata:
  name: app
spec:
  template:
    spec:
      containers:
        - name: app
          image: "myregistry.io:5000/team/app:v2"
        - name: proxy
          image: nginx
---
# Source: app/templates/job.yaml
apiVersion: batch/v1
kind: Job
spec:
  template:
    spec:
      containers:
        - name: migrate
          image: app@sha256:abcd
        - name: web
          image: nginx:latest
"#;

    fn values(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_discover_manifests() {
        let images = discover_images(MANIFESTS, &Value::Null, true);
        assert_eq!(
            images,
            vec![
                "app@sha256:abcd",
                "myregistry.io:5000/team/app:v2",
                "nginx:latest",
            ]
        );
    }

    #[test]
    fn test_values_tree_is_optional() {
        let values = values("helper:\n  image:\n    repository: busybox\n    tag: \"1.36\"\n");
        assert!(discover_images(MANIFESTS, &values, true).contains(&"busybox:1.36".to_string()));
        assert!(!discover_images(MANIFESTS, &values, false).contains(&"busybox:1.36".to_string()));
    }

    #[test]
    fn test_empty_input() {
        let discovery = discover("", &Value::Null, &DiscoveryOptions::default());
        assert!(discovery.is_empty());
        assert!(!discovery.has_warnings());
        assert_eq!(discovery.documents, 0);
    }

    #[test]
    fn test_bad_document_keeps_the_rest() {
        let stream = format!("{}\n---\nspec: [broken\n", MANIFESTS);
        let discovery = discover(&stream, &Value::Null, &DiscoveryOptions::default());
        assert_eq!(discovery.images.len(), 3);
        assert_eq!(discovery.documents, 2);
        assert_eq!(discovery.warnings.len(), 1);
    }

    #[test]
    fn test_digest_pinned_mode() {
        let manifests = "image: ghcr.io/org/app:1.0@sha256:abcd\n";
        let options = DiscoveryOptions::default().with_mode(NormalizeMode::DigestPinned);
        assert_eq!(
            discover(manifests, &Value::Null, &options).images,
            vec!["ghcr.io/org/app@sha256:abcd"]
        );
        assert_eq!(
            discover_images(manifests, &Value::Null, true),
            vec!["ghcr.io/org/app:1.0"]
        );
    }

    #[test]
    fn test_deterministic() {
        let values = values("image:\n  repository: redis\n  tag: \"7\"\n");
        let first = discover_images(MANIFESTS, &values, true);
        let second = discover_images(MANIFESTS, &values, true);
        assert_eq!(first, second);
    }
}
