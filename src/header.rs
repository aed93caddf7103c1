//! Source decoding and format detection.
//!
//! Decodes raw export bytes permissively and sniffs the first lines of the
//! file to classify it as a Meteoblue or Synoptic export, locating the row
//! that carries the column headers.

use crate::constants::{
    DETECTION_LINE_COUNT, FALLBACK_HEADER_ROW, METEOBLUE_LOCATION_TOKEN, SYNOPTIC_MARKER_LINE_COUNT,
    SYNOPTIC_STATION_MARKER, SYNOPTIC_TIME_COLUMN, SYNOPTIC_VENDOR_TOKEN, TIMESTAMP_COLUMN,
};
use crate::models::{FormatDescriptor, FormatKind};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Decode export bytes as UTF-8, dropping a byte-order mark and any invalid
/// byte sequences
pub fn decode_source(bytes: &[u8]) -> Cow<'_, str> {
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        warn!("Source contains invalid UTF-8 sequences; they will be ignored");
        Cow::Owned(text.chars().filter(|c| *c != '\u{FFFD}').collect())
    } else {
        text
    }
}

/// First lines of the decoded text used for detection, trimmed
pub fn preamble_lines(text: &str) -> Vec<&str> {
    text.lines()
        .take(DETECTION_LINE_COUNT)
        .map(str::trim)
        .collect()
}

/// Classify a file from its preamble.
///
/// Rules are evaluated in order and the first match wins:
/// 1. a Synoptic marker in the first 10 lines plus a `Date_Time` line
/// 2. a line starting with `timestamp` preceded by a line mentioning `moab`
/// 3. the legacy Meteoblue layout with the header on row 9
pub fn detect_format(lines: &[&str]) -> FormatDescriptor {
    detect_format_with_fallback(lines, FALLBACK_HEADER_ROW)
}

/// Same as [`detect_format`] with a caller-chosen header row for rule 3
pub fn detect_format_with_fallback(lines: &[&str], fallback_header_row: usize) -> FormatDescriptor {
    let lines = &lines[..lines.len().min(DETECTION_LINE_COUNT)];

    if let Some(header_row) = detect_synoptic(lines) {
        debug!("Detected Synoptic export, header on row {}", header_row);
        return FormatDescriptor::new(FormatKind::Synoptic, header_row);
    }

    if let Some(header_row) = detect_meteoblue(lines) {
        debug!("Detected Meteoblue export, header on row {}", header_row);
        return FormatDescriptor::new(FormatKind::Meteoblue, header_row);
    }

    debug!(
        "No format markers found, assuming legacy Meteoblue layout with header on row {}",
        fallback_header_row
    );
    FormatDescriptor::new(FormatKind::Meteoblue, fallback_header_row)
}

fn detect_synoptic(lines: &[&str]) -> Option<usize> {
    let has_marker = lines.iter().take(SYNOPTIC_MARKER_LINE_COUNT).any(|line| {
        line.contains(SYNOPTIC_STATION_MARKER)
            || line.to_lowercase().contains(SYNOPTIC_VENDOR_TOKEN)
    });

    if !has_marker {
        return None;
    }

    lines
        .iter()
        .position(|line| line.contains(SYNOPTIC_TIME_COLUMN))
}

/// First `timestamp` line with a Moab mention somewhere above it
fn detect_meteoblue(lines: &[&str]) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().starts_with(TIMESTAMP_COLUMN))
        .map(|(row, _)| row)
        .find(|row| {
            lines[..*row]
                .join(" ")
                .to_lowercase()
                .contains(METEOBLUE_LOCATION_TOKEN)
        })
}
