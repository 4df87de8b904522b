//! Aggregation of image candidates across trees.

use std::collections::BTreeSet;

use serde_yaml::Value;

use crate::analyzer::images::parser::reference::{ImageReference, NormalizeMode};
use crate::analyzer::images::types::{
    Discovery, DiscoveryWarning, ImageCandidate, TreeOrigin,
};
use crate::analyzer::images::walk::ImageFields;

/// Collects normalized images from any number of trees.
///
/// Images are kept in a `BTreeSet`, so the output is deduplicated by exact
/// string equality and sorted ascending.
#[derive(Debug)]
pub struct ImageCollector {
    mode: NormalizeMode,
    max_depth: usize,
    images: BTreeSet<String>,
    warnings: Vec<DiscoveryWarning>,
}

impl ImageCollector {
    pub fn new(mode: NormalizeMode, max_depth: usize) -> Self {
        Self {
            mode,
            max_depth,
            images: BTreeSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Walk one tree and add its images.
    ///
    /// Candidates are buffered until the walk completes: if the tree turns
    /// out to be too deep, none of its candidates are kept.
    pub fn collect_tree(&mut self, tree: &Value, origin: &TreeOrigin) -> usize {
        let mut candidates = Vec::new();
        for result in ImageFields::new(tree, self.max_depth) {
            match result {
                Ok(candidate) => candidates.push(candidate),
                Err(error) => {
                    self.record(DiscoveryWarning::DepthLimitExceeded {
                        origin: origin.to_string(),
                        error,
                    });
                    return 0;
                }
            }
        }

        let found = candidates.len();
        for candidate in candidates {
            self.add_candidate(&candidate, origin);
        }
        found
    }

    /// Parse and normalize one candidate; malformed ones become warnings.
    pub fn add_candidate(&mut self, candidate: &ImageCandidate, origin: &TreeOrigin) {
        match ImageReference::parse(&candidate.to_image_string()) {
            Ok(reference) => {
                let image = reference.render(self.mode);
                log::trace!("{}: {} -> {}", origin, candidate.path(), image);
                self.images.insert(image);
            }
            Err(error) => self.record(DiscoveryWarning::Format {
                origin: origin.to_string(),
                path: candidate.path().to_string(),
                error,
            }),
        }
    }

    pub fn record(&mut self, warning: DiscoveryWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn finish(self, documents: usize) -> Discovery {
        Discovery {
            images: self.images.into_iter().collect(),
            warnings: self.warnings,
            documents,
        }
    }
}
