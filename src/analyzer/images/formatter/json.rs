//! JSON formatter.

use serde::Serialize;

use crate::analyzer::images::types::{Discovery, DiscoveryWarning};

/// Format the images as a JSON array.
pub fn format(result: &Discovery) -> String {
    let mut output = serde_json::to_string(&result.images).unwrap_or_else(|_| "[]".to_string());
    output.push('\n');
    output
}

/// Format the full result, warnings included.
pub fn format_report(result: &Discovery) -> String {
    let report = JsonReport::from(result);
    let mut output = serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string());
    output.push('\n');
    output
}

#[derive(Serialize)]
struct JsonReport<'a> {
    images: &'a [String],
    warnings: Vec<JsonWarning>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonWarning {
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct JsonSummary {
    documents: usize,
    images: usize,
    warnings: usize,
}

impl<'a> From<&'a Discovery> for JsonReport<'a> {
    fn from(result: &'a Discovery) -> Self {
        Self {
            images: &result.images,
            warnings: result.warnings.iter().map(JsonWarning::from).collect(),
            summary: JsonSummary {
                documents: result.documents,
                images: result.images.len(),
                warnings: result.warnings.len(),
            },
        }
    }
}

impl From<&DiscoveryWarning> for JsonWarning {
    fn from(warning: &DiscoveryWarning) -> Self {
        let kind = match warning {
            DiscoveryWarning::StructuralParse { .. } => "structural-parse",
            DiscoveryWarning::Format { .. } => "format",
            DiscoveryWarning::DepthLimitExceeded { .. } => "depth-limit-exceeded",
        };
        Self {
            kind,
            message: warning.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::images::types::ImageError;

    #[test]
    fn test_json_array() {
        let result = Discovery {
            images: vec!["nginx:latest".to_string()],
            ..Default::default()
        };
        assert_eq!(format(&result), "[\"nginx:latest\"]\n");
    }

    #[test]
    fn test_report() {
        let result = Discovery {
            images: vec!["nginx:latest".to_string()],
            warnings: vec![DiscoveryWarning::Format {
                origin: "values tree".to_string(),
                path: "image".to_string(),
                error: ImageError::Empty,
            }],
            documents: 2,
        };
        let value: serde_json::Value = serde_json::from_str(&format_report(&result)).unwrap();
        assert_eq!(value["images"][0], "nginx:latest");
        assert_eq!(value["warnings"][0]["kind"], "format");
        assert_eq!(value["summary"]["documents"], 2);
        assert_eq!(value["summary"]["warnings"], 1);
    }
}
