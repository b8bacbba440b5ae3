//! License text normalization.
//!
//! License files are turned into display-safe resources: names become
//! resource-friendly identifiers and content is escaped line by line.

use serde::Serialize;

/// Replacement for a whitespace-only line.
pub const PARAGRAPH_BREAK: &str = "<br /><br />";

/// One processed license file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseEntry {
    pub source_file_name: String,
    pub normalized_file_name: String,
    pub transformed_lines: Vec<String>,
}

impl LicenseEntry {
    /// Build an entry from a file name and its raw content.
    pub fn new(source_file_name: impl Into<String>, content: &str) -> Self {
        let source_file_name = source_file_name.into();
        LicenseEntry {
            normalized_file_name: normalize_name(&source_file_name),
            transformed_lines: transform_content(content),
            source_file_name,
        }
    }

    /// Rendered output file content, one line per transformed line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.transformed_lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Normalize a license file name: `BSL-1.0.txt` -> `bsl_1_0.txt`.
///
/// Pure and idempotent.
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let stem = lower.strip_suffix(".txt").unwrap_or(&lower);
    let mut out: String = stem
        .chars()
        .map(|c| if c == '-' || c == '.' { '_' } else { c })
        .collect();
    out.push_str(".txt");
    out
}

/// Transform a single line.
pub fn transform_line(line: &str) -> String {
    if line.trim().is_empty() {
        PARAGRAPH_BREAK.to_string()
    } else {
        html_escape::encode_quoted_attribute(line).into_owned()
    }
}

/// Transform every line of `content`, preserving order and count.
pub fn transform_content(content: &str) -> Vec<String> {
    content.lines().map(transform_line).collect()
}
