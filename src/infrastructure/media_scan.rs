// src/infrastructure/media_scan.rs
//
// Media folder scanning
//
// Produces the candidate file list the EpisodeMatcher works on.
// Read-only: nothing under the folder is touched.

use std::path::Path;

use crate::domain::naming::has_video_extension;
use crate::domain::path_safety::to_posix;
use crate::error::{AppError, AppResult};

/// Walk `folder` and return the POSIX paths of every video file, sorted.
pub fn scan_media_folder<S: AsRef<str>>(folder: &Path, extensions: &[S]) -> AppResult<Vec<String>> {
    if !folder.exists() {
        return Err(AppError::Other(format!(
            "Media folder does not exist: {}",
            folder.display()
        )));
    }
    if !folder.is_dir() {
        return Err(AppError::Other(format!(
            "Media folder is not a directory: {}",
            folder.display()
        )));
    }

    let mut videos = Vec::new();

    for entry in walkdir::WalkDir::new(folder).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", folder.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = to_posix(&entry.path().to_string_lossy());
        if has_video_extension(&path, extensions) {
            videos.push(path);
        }
    }

    videos.sort();
    log::debug!("Found {} video file(s) under {}", videos.len(), folder.display());
    Ok(videos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::naming::DEFAULT_VIDEO_EXTENSIONS;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_scan_returns_sorted_video_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Season 02/b.mkv");
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "Season 01/c.AVI");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "Season 01/c.srt");

        let files = scan_media_folder(dir.path(), DEFAULT_VIDEO_EXTENSIONS).unwrap();
        let root = to_posix(&dir.path().to_string_lossy());

        assert_eq!(
            files,
            vec![
                format!("{}/Season 01/c.AVI", root),
                format!("{}/Season 02/b.mkv", root),
                format!("{}/a.mp4", root),
            ]
        );
    }

    #[test]
    fn test_scan_respects_configured_extensions() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.mkv");

        let files = scan_media_folder(dir.path(), &["mkv".to_string()]).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("/b.mkv"));
    }

    #[test]
    fn test_scan_missing_folder_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        assert!(scan_media_folder(&missing, DEFAULT_VIDEO_EXTENSIONS).is_err());
    }

    #[test]
    fn test_scan_empty_folder_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = scan_media_folder(dir.path(), DEFAULT_VIDEO_EXTENSIONS).unwrap();
        assert!(files.is_empty());
    }
}
