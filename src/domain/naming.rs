// src/domain/naming.rs
//
// Media-server naming scheme
//
// `{folder}/Season 01/{Show} - S01E02.mkv`, with season 0 stored under
// `Specials`. Pure string construction over POSIX paths.

use super::path_safety::{normalize_posix, to_posix};
use super::plan::RenameTask;
use super::recognition::EpisodeMatch;

/// Extensions treated as episode video files unless configured otherwise
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "webm", "m4v", "mov", "wmv", "ts"];

/// Characters rejected by at least one common filesystem
const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strip characters that are not allowed in file names and collapse spaces.
pub fn sanitize_show_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if INVALID_NAME_CHARS.contains(&c) || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();

    replaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('.')
        .to_string()
}

pub fn season_folder_name(season: u32) -> String {
    if season == 0 {
        "Specials".to_string()
    } else {
        format!("Season {:02}", season)
    }
}

/// `Show - S01E02.mkv`
pub fn episode_file_name(show: &str, season: u32, episode: u32, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    let base = format!("{} - S{:02}E{:02}", sanitize_show_name(show), season, episode);
    if extension.is_empty() {
        base
    } else {
        format!("{}.{}", base, extension)
    }
}

pub fn episode_destination(
    media_folder_path: &str,
    show: &str,
    season: u32,
    episode: u32,
    extension: &str,
) -> String {
    let folder = normalize_posix(&to_posix(media_folder_path));
    format!(
        "{}/{}/{}",
        folder.trim_end_matches('/'),
        season_folder_name(season),
        episode_file_name(show, season, episode, extension)
    )
}

/// Lower-cased extension of a POSIX path, if any.
pub fn file_extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Whether `path` ends in one of `extensions` (case-insensitive, leading dot optional).
pub fn has_video_extension<S: AsRef<str>>(path: &str, extensions: &[S]) -> bool {
    match file_extension(&to_posix(path)) {
        Some(ext) => extensions
            .iter()
            .any(|e| e.as_ref().trim_start_matches('.').eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

/// Build rename tasks moving each recognized file to its canonical name.
/// Files already at their destination produce no task.
pub fn rename_tasks_for_matches(
    media_folder_path: &str,
    show: &str,
    matches: &[EpisodeMatch],
) -> Vec<RenameTask> {
    matches
        .iter()
        .filter_map(|m| {
            let extension = file_extension(&m.video_file_path).unwrap_or_default();
            let to = episode_destination(media_folder_path, show, m.season, m.episode, &extension);
            let from = to_posix(&m.video_file_path);
            if from == to {
                None
            } else {
                Some(RenameTask::new(from, to))
            }
        })
        .collect()
}
