//! Multi-document YAML splitting for rendered manifests.
//!
//! `helm template` output is a stream of documents separated by `---`, each
//! usually preceded by a `# Source: <chart>/templates/<file>` comment. Segments
//! are parsed one at a time so a single malformed document cannot take the
//! rest of the stream down with it.

use serde_yaml::Value;

use crate::analyzer::images::types::DiscoveryWarning;

const SOURCE_PREFIX: &str = "# Source:";

/// One parsed document from a manifest stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// 1-based position of the segment in the stream.
    pub index: usize,
    /// 1-based line where the segment starts.
    pub line: usize,
    /// Template path from the `# Source:` comment, if any.
    pub source: Option<String>,
    pub tree: Value,
}

/// Documents that parsed plus warnings for the segments that did not.
#[derive(Debug, Clone, Default)]
pub struct SplitOutcome {
    pub documents: Vec<Document>,
    pub warnings: Vec<DiscoveryWarning>,
}

#[derive(Debug, Default)]
struct Segment {
    line: usize,
    text: String,
}

impl Segment {
    fn starting_at(line: usize) -> Self {
        Self {
            line,
            text: String::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    /// Only blank lines, comments and `%` directives such as `%YAML 1.2`.
    fn is_blank(&self) -> bool {
        self.text.lines().all(|l| {
            let trimmed = l.trim();
            trimmed.is_empty() || trimmed.starts_with('#') || l.starts_with('%')
        })
    }

    fn source(&self) -> Option<String> {
        self.text.lines().find_map(|l| {
            l.trim()
                .strip_prefix(SOURCE_PREFIX)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
    }
}

/// Split a YAML stream into parsed documents.
///
/// Empty and comment-only segments are skipped silently, as are documents
/// that are explicitly `null`. Segments that fail to parse are skipped and
/// reported as `StructuralParse` warnings. An empty stream yields nothing.
pub fn split_documents(content: &str) -> SplitOutcome {
    let mut outcome = SplitOutcome::default();

    for (position, segment) in segments(content).into_iter().enumerate() {
        let index = position + 1;
        if segment.is_blank() {
            continue;
        }

        match serde_yaml::from_str::<Value>(&segment.text) {
            Ok(Value::Null) => {}
            Ok(tree) => outcome.documents.push(Document {
                index,
                line: segment.line,
                source: segment.source(),
                tree,
            }),
            Err(e) => {
                let line = e
                    .location()
                    .map(|l| segment.line + l.line().saturating_sub(1))
                    .unwrap_or(segment.line);
                log::debug!("Skipping unparseable document {} at line {}: {}", index, line, e);
                outcome.warnings.push(DiscoveryWarning::StructuralParse {
                    document: index,
                    line,
                    message: e.to_string(),
                });
            }
        }
    }

    outcome
}

/// Cut the stream at `---` and `...` marker lines.
fn segments(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = Segment::starting_at(1);

    for (i, line) in content.lines().enumerate() {
        let line_number = i + 1;

        if let Some(rest) = document_start(line) {
            segments.push(std::mem::replace(
                &mut current,
                Segment::starting_at(line_number),
            ));
            // Content may follow the marker on the same line ("--- {a: 1}")
            if !rest.is_empty() {
                current.push_line(rest);
            }
        } else if is_document_end(line) {
            segments.push(std::mem::replace(
                &mut current,
                Segment::starting_at(line_number + 1),
            ));
        } else {
            current.push_line(line);
        }
    }

    segments.push(current);
    segments
}

/// Returns the remainder of the line when it opens a new document.
fn document_start(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("---")?;
    if rest.is_empty() {
        return Some("");
    }
    if rest.starts_with(char::is_whitespace) {
        return Some(rest.trim());
    }
    None
}

fn is_document_end(line: &str) -> bool {
    line.strip_prefix("...")
        .map(|rest| rest.trim().is_empty() || rest.trim_start().starts_with('#'))
        .unwrap_or(false)
}
