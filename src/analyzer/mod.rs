//! # Analyzer Module
//!
//! - [`images`] finds and normalizes container image references in
//!   rendered manifests and values trees
//! - [`chart`] turns a chart directory, archive, URL or upload into the
//!   rendered manifests and values tree that discovery consumes

pub mod chart;
pub mod images;
