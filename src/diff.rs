//! Unified-diff parser
//!
//! Turns the raw patch text carried by a change-set artifact into
//! structured per-file change records with line statistics. Parsing is
//! pure and infallible: malformed sections are skipped, not reported as
//! errors, and the number of skipped sections is surfaced for
//! diagnostics.

use serde::Serialize;

/// Marker introducing a new per-file section
const FILE_HEADER: &str = "diff --git ";

/// Sentinel path meaning "this side of the diff does not exist"
const NULL_DEVICE: &str = "/dev/null";

/// How a file was affected by a change set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeType {
    /// File did not exist before the change
    Created,
    /// File existed and was edited
    Modified,
    /// File was removed
    Deleted,
}

/// One file's change record, derived from its diff section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedFile {
    /// Path of the file after the change (before, for deletions)
    pub path: String,
    /// Classification of the change
    pub change_type: ChangeType,
    /// Count of added lines across all hunks
    pub additions: usize,
    /// Count of removed lines across all hunks
    pub deletions: usize,
    /// Best-effort reconstruction of the added material, in
    /// content-reconstruction mode only. Omits unchanged context lines,
    /// so it is not a byte-exact copy of the post-change file.
    pub content: Option<String>,
}

/// Aggregate counts over a parsed change set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSetSummary {
    /// Number of files with a parsed record
    pub total_files: usize,
    /// Files classified as created
    pub created: usize,
    /// Files classified as modified
    pub modified: usize,
    /// Files classified as deleted
    pub deleted: usize,
}

/// Result of parsing one patch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    /// Per-file change records, in patch order
    pub files: Vec<ParsedFile>,
    /// Aggregate counts over `files`
    pub summary: ChangeSetSummary,
    /// Sections skipped because no file paths could be recognized
    pub dropped_sections: usize,
}

/// Parse a unified diff into per-file change records
///
/// Empty input yields an empty report; no input is ever an error.
#[must_use]
pub fn parse(patch: &str) -> DiffReport {
    parse_inner(patch, false)
}

/// Parse a unified diff, reconstructing added content per file
///
/// Reconstruction concatenates the counted `+` lines in order and is only
/// attempted for non-deleted files; deleted files reconstruct to the
/// empty string.
#[must_use]
pub fn parse_with_content(patch: &str) -> DiffReport {
    parse_inner(patch, true)
}

fn parse_inner(patch: &str, with_content: bool) -> DiffReport {
    if patch.is_empty() {
        return DiffReport::default();
    }

    let mut report = DiffReport::default();
    for section in split_sections(patch) {
        match parse_section(&section, with_content) {
            Some(file) => {
                report.summary.total_files += 1;
                match file.change_type {
                    ChangeType::Created => report.summary.created += 1,
                    ChangeType::Modified => report.summary.modified += 1,
                    ChangeType::Deleted => report.summary.deleted += 1,
                }
                report.files.push(file);
            }
            None => report.dropped_sections += 1,
        }
    }
    report
}

/// Group the patch into per-file sections, one per `diff --git` header
///
/// Text before the first header is preamble and produces no section.
fn split_sections(patch: &str) -> Vec<Vec<&str>> {
    let mut sections: Vec<Vec<&str>> = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in patch.lines() {
        if line.starts_with(FILE_HEADER) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(vec![line]);
        } else if let Some(section) = current.as_mut() {
            section.push(line);
        }
    }
    if let Some(section) = current {
        sections.push(section);
    }
    sections
}

fn parse_section(lines: &[&str], with_content: bool) -> Option<ParsedFile> {
    let old_path = marker_path(lines, "--- ");
    let new_path = marker_path(lines, "+++ ");

    // No recognizable path markers at all: skip and continue.
    let (old_path, new_path) = match (old_path, new_path) {
        (None, None) => return None,
        (old, new) => (old.flatten(), new.flatten()),
    };

    let (path, change_type) = match (old_path, new_path) {
        (None, Some(new)) => (new, ChangeType::Created),
        (Some(old), None) => (old, ChangeType::Deleted),
        (Some(_), Some(new)) => (new, ChangeType::Modified),
        (None, None) => return None,
    };

    let mut additions = 0;
    let mut deletions = 0;
    let mut added_lines: Vec<&str> = Vec::new();
    let mut in_hunk = false;
    for line in lines {
        if line.starts_with("@@") {
            // Counts accumulate across hunks; a second header never resets.
            in_hunk = true;
            continue;
        }
        if !in_hunk {
            continue;
        }
        if line.starts_with('+') && !line.starts_with("+++") {
            additions += 1;
            if with_content {
                added_lines.push(&line[1..]);
            }
        } else if line.starts_with('-') && !line.starts_with("---") {
            deletions += 1;
        }
    }

    let content = if with_content {
        match change_type {
            ChangeType::Deleted => Some(String::new()),
            _ => Some(added_lines.join("\n")),
        }
    } else {
        None
    };

    Some(ParsedFile {
        path: path.to_string(),
        change_type,
        additions,
        deletions,
        content,
    })
}

/// Find the first marker line with the given prefix and extract its path
///
/// Outer `None` means the marker line is missing; inner `None` means the
/// marker points at the null device, i.e. that side does not exist.
fn marker_path<'a>(lines: &[&'a str], prefix: &str) -> Option<Option<&'a str>> {
    let raw = lines
        .iter()
        .find_map(|line| line.strip_prefix(prefix))?
        .trim_end();
    if raw == NULL_DEVICE {
        return Some(None);
    }
    let path = raw
        .strip_prefix("a/")
        .or_else(|| raw.strip_prefix("b/"))
        .unwrap_or(raw);
    Some(Some(path))
}
