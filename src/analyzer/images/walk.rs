//! Image field discovery over schema-less YAML trees.
//!
//! Manifests differ per template, dependency chart and custom resource, so
//! there is no schema to follow. Instead every mapping node is checked for
//! the two shapes that denote an image:
//!
//! 1. an `image` key holding a string (`image: nginx:1.25`), or
//! 2. two or more of `repository`, `tag`, `digest`, `registry` side by side
//!    (`{repository: redis, tag: "7"}`).
//!
//! Some charts split the name across both shapes
//! (`{repository: docker.io/bitnami, image: redis, tag: "7"}`). When the
//! `image` string is a bare name and the node also has a `repository` or
//! `registry` plus a `tag` or `digest`, the fields form one structured
//! image `[registry/][repository/]image[:tag][@digest]`.
//!
//! Bare strings in lists are never treated as images.

use std::iter::FusedIterator;

use serde_yaml::{Mapping, Value};

use crate::analyzer::images::types::{DepthLimitExceeded, ImageCandidate, StructuredImage};

const IMAGE_KEY: &str = "image";
const STRUCTURED_KEYS: [&str; 4] = ["repository", "tag", "digest", "registry"];

struct Frame<'a> {
    node: &'a Value,
    depth: usize,
    path: String,
}

/// Lazy, single-pass iterator over the image candidates of one tree.
///
/// Order is depth-first, parent before children, keys and list entries in
/// document order. Uses an explicit stack, so deeply nested input cannot
/// overflow the call stack; a node deeper than `max_depth` yields one
/// `DepthLimitExceeded` and ends the iteration.
pub struct ImageFields<'a> {
    stack: Vec<Frame<'a>>,
    max_depth: usize,
}

impl<'a> ImageFields<'a> {
    pub fn new(tree: &'a Value, max_depth: usize) -> Self {
        Self {
            stack: vec![Frame {
                node: tree,
                depth: 0,
                path: String::new(),
            }],
            max_depth,
        }
    }

    fn push_mapping(&mut self, map: &'a Mapping, parent: &Frame<'a>) {
        let children: Vec<_> = map
            .iter()
            .filter(|(_, value)| is_container(value))
            .map(|(key, value)| Frame {
                node: value,
                depth: parent.depth + 1,
                path: join_key(&parent.path, &key_label(key)),
            })
            .collect();
        self.stack.extend(children.into_iter().rev());
    }

    fn push_sequence(&mut self, seq: &'a [Value], parent: &Frame<'a>) {
        let children: Vec<_> = seq
            .iter()
            .enumerate()
            .filter(|(_, value)| is_container(value))
            .map(|(i, value)| Frame {
                node: value,
                depth: parent.depth + 1,
                path: format!("{}[{}]", parent.path, i),
            })
            .collect();
        self.stack.extend(children.into_iter().rev());
    }
}

impl Iterator for ImageFields<'_> {
    type Item = Result<ImageCandidate, DepthLimitExceeded>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            if frame.depth > self.max_depth {
                self.stack.clear();
                return Some(Err(DepthLimitExceeded {
                    path: frame.path,
                    max_depth: self.max_depth,
                }));
            }

            match untag(frame.node) {
                Value::Mapping(map) => {
                    self.push_mapping(map, &frame);
                    if let Some(candidate) = recognize(map, &frame.path) {
                        return Some(Ok(candidate));
                    }
                }
                Value::Sequence(seq) => self.push_sequence(seq, &frame),
                _ => {}
            }
        }
        None
    }
}

impl FusedIterator for ImageFields<'_> {}

/// Walk one tree, yielding its image candidates.
pub fn image_fields(tree: &Value, max_depth: usize) -> ImageFields<'_> {
    ImageFields::new(tree, max_depth)
}

/// Apply the recognition rules to a single mapping node.
fn recognize(map: &Mapping, path: &str) -> Option<ImageCandidate> {
    if let Some(Value::String(image)) = map.get(IMAGE_KEY).map(untag) {
        return Some(split_image(map, path, image).unwrap_or_else(|| ImageCandidate::Raw {
            path: join_key(path, IMAGE_KEY),
            value: image.clone(),
        }));
    }

    let present = STRUCTURED_KEYS
        .iter()
        .filter(|key| scalar_field(map, key).is_some())
        .count();
    if present < 2 {
        return None;
    }

    let registry = scalar_field(map, "registry");
    // Bitnami-style `{registry, name, tag}` spells the repository as `name`
    let repository = scalar_field(map, "repository").or_else(|| {
        registry
            .as_ref()
            .and_then(|_| scalar_field(map, "name"))
    })?;

    Some(ImageCandidate::Structured {
        path: path.to_string(),
        image: StructuredImage {
            registry,
            repository,
            tag: scalar_field(map, "tag"),
            digest: scalar_field(map, "digest"),
        },
    })
}

/// `{[registry,] [repository,] image, tag|digest}` with a bare `image` name.
fn split_image(map: &Mapping, path: &str, image: &str) -> Option<ImageCandidate> {
    let name = image.trim();
    if name.is_empty() || name.contains([':', '@']) {
        return None;
    }

    let registry = scalar_field(map, "registry");
    let prefix = scalar_field(map, "repository");
    let tag = scalar_field(map, "tag");
    let digest = scalar_field(map, "digest");
    if (registry.is_none() && prefix.is_none()) || (tag.is_none() && digest.is_none()) {
        return None;
    }

    let repository = match prefix {
        Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), name),
        None => name.to_string(),
    };
    Some(ImageCandidate::Structured {
        path: path.to_string(),
        image: StructuredImage {
            registry,
            repository,
            tag,
            digest,
        },
    })
}

/// A non-empty string or number stored under `key`.
fn scalar_field(map: &Mapping, key: &str) -> Option<String> {
    match map.get(key).map(untag)? {
        Value::String(s) => Some(s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn is_container(value: &Value) -> bool {
    matches!(untag(value), Value::Mapping(_) | Value::Sequence(_))
}

fn key_label(key: &Value) -> String {
    match untag(key) {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "~".to_string(),
        _ => "?".to_string(),
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
