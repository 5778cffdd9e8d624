//! Parser for exported documentation.
//!
//! Recognises only the export format: a `## <path>` heading, optional blank
//! lines, then a backtick fence. Everything up to a closing fence at least as
//! long as the opening one is that file's content. Other Markdown is skipped.

use serde::{Deserialize, Serialize};

use crate::export::markdown::STRUCTURE_HEADING;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileUnit {
    pub path: String,
    pub content: String,
}

/// Length of a backtick fence opening `line`, if it is one.
fn opening_fence(line: &str) -> Option<usize> {
    let trimmed = line.trim_start().trim_end_matches('\r');
    let ticks = trimmed.chars().take_while(|c| *c == '`').count();
    (ticks >= 3).then_some(ticks)
}

fn closes_fence(line: &str, fence_len: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= fence_len && trimmed.chars().all(|c| c == '`')
}

fn heading_path(line: &str) -> Option<&str> {
    let path = line.trim_end_matches('\r').strip_prefix("## ")?.trim();
    (!path.is_empty()).then_some(path)
}

pub fn parse_markdown(text: &str) -> Vec<FileUnit> {
    // Split on `\n` only: a `\r` before it belongs to the file's content.
    let mut lines: Vec<&str> = text.split('\n').collect();
    if text.ends_with('\n') {
        lines.pop();
    }
    let mut units = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(path) = heading_path(lines[i]) else {
            i += 1;
            continue;
        };
        i += 1;

        while i < lines.len() && lines[i].trim().is_empty() {
            i += 1;
        }
        let Some(fence_len) = lines.get(i).and_then(|l| opening_fence(l)) else {
            continue;
        };
        i += 1;

        let start = i;
        while i < lines.len() && !closes_fence(lines[i], fence_len) {
            i += 1;
        }
        let body = &lines[start..i];
        // Skip the closing fence.
        i += 1;

        if path == STRUCTURE_HEADING {
            continue;
        }

        let mut content = body.join("\n");
        if !body.is_empty() {
            content.push('\n');
        }
        units.push(FileUnit { path: path.to_string(), content });
    }

    units
}
