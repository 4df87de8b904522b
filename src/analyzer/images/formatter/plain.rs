//! Plain text formatter.

use crate::analyzer::images::types::Discovery;

/// One image per line, in discovery order (already sorted).
pub fn format(result: &Discovery) -> String {
    let mut output = String::new();
    for image in &result.images {
        output.push_str(image);
        output.push('\n');
    }
    output
}
