//! Manifest stream splitting and image reference parsing.

pub mod reference;
pub mod yaml;

pub use reference::{ImageReference, NormalizeMode, normalize};
pub use yaml::{Document, SplitOutcome, split_documents};
