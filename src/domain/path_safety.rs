// src/domain/path_safety.rs
//
// Path Safety - admission checks for rename tasks
//
// CRITICAL RULES:
// - Pure functions over path strings: no I/O, no state
// - Deterministic and order-preserving over the input sequence
// - Containment is decided on the canonical POSIX form, never the raw string
// - Checks run in order: abnormal paths, duplicated sources/destinations,
//   media folder containment

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::plan::RenameTask;

// ============================================================================
// PATH FORMS
// ============================================================================

/// Convert any separator style to forward slashes.
pub fn to_posix(path: &str) -> String {
    path.replace('\\', "/")
}

/// Render an internal POSIX path for the local filesystem.
pub fn render_for_platform(path: &str) -> std::path::PathBuf {
    if cfg!(windows) {
        std::path::PathBuf::from(path.replace('/', "\\"))
    } else {
        std::path::PathBuf::from(path)
    }
}

/// Remove a leading volume prefix (`//?/`, `//./`) and a single-letter drive
/// (`C:`), so paths from different platforms compare uniformly.
pub fn strip_volume_prefix(path: &str) -> &str {
    let mut rest = path;
    for prefix in ["//?/", "//./"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }

    let bytes = rest.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        rest = &rest[2..];
    }

    rest
}

/// Collapse `.` and `..` segments and repeated separators.
///
/// Absolute paths never climb above `/`. Relative paths keep leading `..`
/// segments that cannot be resolved.
pub fn normalize_posix(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// True when the path names a root after any drive or device prefix is removed.
pub fn is_absolute_path(path: &str) -> bool {
    strip_volume_prefix(&to_posix(path)).starts_with('/')
}

/// Canonical, drive-agnostic absolute form used for containment checks.
/// A relative input is read as if it hung off `/`.
pub fn canonical_form(path: &str) -> String {
    let posix = to_posix(path);
    let stripped = strip_volume_prefix(&posix);

    if stripped.starts_with('/') {
        normalize_posix(stripped)
    } else {
        normalize_posix(&format!("/{}", stripped))
    }
}

/// True when the literal path differs from its normalized form (`.`/`..`
/// segments, repeated separators). A trailing `/` is tolerated. Paths
/// starting with `../` are deliberately relative and exempt.
pub fn is_abnormal_path(path: &str) -> bool {
    let posix = to_posix(path);
    if posix.starts_with("../") {
        return false;
    }

    let stripped = strip_volume_prefix(&posix);
    let literal = match stripped.trim_end_matches('/') {
        "" if stripped.starts_with('/') => "/",
        trimmed => trimmed,
    };

    normalize_posix(literal) != literal
}

// ============================================================================
// CHECK RESULTS
// ============================================================================

/// Which side of a task a path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathRole {
    Source,
    Destination,
}

impl fmt::Display for PathRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRole::Source => write!(f, "source"),
            PathRole::Destination => write!(f, "destination"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub is_valid: bool,
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidPath {
    pub path: String,
    #[serde(rename = "type")]
    pub role: PathRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainmentCheck {
    pub is_valid: bool,
    pub invalid_paths: Vec<InvalidPath>,
}

/// A single reason a task set was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathViolation {
    AbnormalPath { path: String },
    DuplicatedSource { path: String },
    DuplicatedDestination { path: String },
    OutsideMediaFolder { path: String, role: PathRole },
    RelativePath { path: String, role: PathRole },
    DuplicatedEpisode { season: u32, episode: u32 },
    InvalidEpisodeNumber { path: String },
}

impl fmt::Display for PathViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathViolation::AbnormalPath { path } => write!(f, "abnormal path: {}", path),
            PathViolation::DuplicatedSource { path } => {
                write!(f, "source file appears more than once: {}", path)
            }
            PathViolation::DuplicatedDestination { path } => {
                write!(f, "destination file appears more than once: {}", path)
            }
            PathViolation::OutsideMediaFolder { path, role } => {
                write!(f, "{} path is outside the media folder: {}", role, path)
            }
            PathViolation::RelativePath { path, role } => {
                write!(f, "{} path is not absolute: {}", role, path)
            }
            PathViolation::DuplicatedEpisode { season, episode } => {
                write!(f, "episode S{:02}E{:02} appears more than once", season, episode)
            }
            PathViolation::InvalidEpisodeNumber { path } => {
                write!(f, "episode number must be at least 1: {}", path)
            }
        }
    }
}

/// Aggregated violations for a refused task set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<PathViolation>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

// ============================================================================
// CHECKS
// ============================================================================

/// Describe every `from`/`to` value whose literal form is not normalized.
pub fn validate_no_abnormal_paths(tasks: &[RenameTask]) -> Vec<String> {
    let mut violations = Vec::new();
    for task in tasks {
        if is_abnormal_path(&task.from) {
            violations.push(format!("abnormal source path: {}", task.from));
        }
        if is_abnormal_path(&task.to) {
            violations.push(format!("abnormal destination path: {}", task.to));
        }
    }
    violations
}

pub fn validate_no_duplicated_source_file(tasks: &[RenameTask]) -> DuplicateCheck {
    find_duplicates(tasks.iter().map(|t| t.from.as_str()))
}

pub fn validate_no_duplicated_dest_file(tasks: &[RenameTask]) -> DuplicateCheck {
    find_duplicates(tasks.iter().map(|t| t.to.as_str()))
}

/// Flag every path that is relative or whose canonical form is not strictly
/// beneath the media folder.
pub fn validate_path_within_media_folder(
    media_folder_path: &str,
    tasks: &[RenameTask],
) -> ContainmentCheck {
    let folder = canonical_form(media_folder_path);
    let mut invalid_paths = Vec::new();

    for task in tasks {
        for (path, role) in [(&task.from, PathRole::Source), (&task.to, PathRole::Destination)] {
            if !contained(&folder, path) {
                invalid_paths.push(InvalidPath {
                    path: path.clone(),
                    role,
                });
            }
        }
    }

    ContainmentCheck {
        is_valid: invalid_paths.is_empty(),
        invalid_paths,
    }
}

/// Run the three checks in order and collect all violations.
pub fn validate_rename_tasks(
    media_folder_path: &str,
    tasks: &[RenameTask],
) -> Result<(), ValidationReport> {
    let mut violations = Vec::new();

    for task in tasks {
        for path in [&task.from, &task.to] {
            if is_abnormal_path(path) {
                violations.push(PathViolation::AbnormalPath { path: path.clone() });
            }
        }
    }

    let sources = validate_no_duplicated_source_file(tasks);
    violations.extend(
        sources
            .duplicates
            .into_iter()
            .map(|path| PathViolation::DuplicatedSource { path }),
    );

    let destinations = validate_no_duplicated_dest_file(tasks);
    violations.extend(
        destinations
            .duplicates
            .into_iter()
            .map(|path| PathViolation::DuplicatedDestination { path }),
    );

    let containment = validate_path_within_media_folder(media_folder_path, tasks);
    violations.extend(
        containment
            .invalid_paths
            .into_iter()
            .map(|p| {
                if is_absolute_path(&p.path) {
                    PathViolation::OutsideMediaFolder {
                        path: p.path,
                        role: p.role,
                    }
                } else {
                    PathViolation::RelativePath {
                        path: p.path,
                        role: p.role,
                    }
                }
            }),
    );

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport { violations })
    }
}

/// Containment for a single path (used by recognition plans).
pub fn path_within_media_folder(media_folder_path: &str, path: &str) -> bool {
    contained(&canonical_form(media_folder_path), path)
}

// The executor resolves relative paths against the working directory, so they
// never count as contained.
fn contained(folder: &str, path: &str) -> bool {
    is_absolute_path(path) && is_within(folder, &canonical_form(path))
}

fn is_within(folder: &str, path: &str) -> bool {
    if folder == "/" {
        return path != "/";
    }
    path.strip_prefix(folder)
        .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
}

/// Values naming the same file two or more times, in order of first
/// appearance. Spellings that differ only in separators compare equal and are
/// reported by their first literal value.
fn find_duplicates<'a>(values: impl Iterator<Item = &'a str>) -> DuplicateCheck {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<(String, &str)> = Vec::new();

    for value in values {
        let key = normalize_posix(&to_posix(value));
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push((key, value));
        }
        *count += 1;
    }

    let duplicates: Vec<String> = order
        .into_iter()
        .filter(|(key, _)| counts.get(key).copied().unwrap_or(0) >= 2)
        .map(|(_, value)| value.to_string())
        .collect();

    DuplicateCheck {
        is_valid: duplicates.is_empty(),
        duplicates,
    }
}

// ============================================================================
// TESTS
// ============================================================================
