//! `title:`, `author:` and `zgedelta` markers in comment lines.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataMarker {
    Title(String),
    Author(String),
    DeltaMode,
}

/// Detect a metadata marker on a comment-bearing line.
///
/// Markers are matched case-insensitively anywhere on the line; at most one is
/// reported per line, in the order title, author, delta mode.
pub fn parse_metadata_line(line: &str) -> Option<MetadataMarker> {
    if !line.contains("//") {
        return None;
    }
    // ASCII lowercasing keeps byte offsets valid for slicing `line`.
    let lower = line.to_ascii_lowercase();
    if let Some(at) = lower.find("title:") {
        return Some(MetadataMarker::Title(line[at + "title:".len()..].trim().to_string()));
    }
    if let Some(at) = lower.find("author:") {
        return Some(MetadataMarker::Author(line[at + "author:".len()..].trim().to_string()));
    }
    if lower.contains("zgedelta") {
        return Some(MetadataMarker::DeltaMode);
    }
    None
}
