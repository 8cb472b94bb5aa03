use std::collections::HashSet;

use super::entity::{RecognizeMediaFilePlan, RenameFilesPlan};
use crate::domain::path_safety::{
    is_absolute_path, is_abnormal_path, path_within_media_folder, validate_rename_tasks, PathRole, PathViolation,
    ValidationReport,
};

/// Admission checks for a rename plan
pub fn validate_rename_plan(plan: &RenameFilesPlan) -> Result<(), ValidationReport> {
    validate_rename_tasks(&plan.media_folder_path, &plan.files)
}

/// Admission checks for a recognition plan:
/// 1. Paths are normalized, absolute and inside the media folder
/// 2. No path is labelled twice
/// 3. No (season, episode) pair is claimed twice
/// 4. Episode numbers start at 1
pub fn validate_recognize_plan(plan: &RecognizeMediaFilePlan) -> Result<(), ValidationReport> {
    let mut violations = Vec::new();
    let mut seen_paths = HashSet::new();
    let mut reported_paths = HashSet::new();
    let mut seen_episodes = HashSet::new();
    let mut reported_episodes = HashSet::new();

    for file in &plan.files {
        if is_abnormal_path(&file.path) {
            violations.push(PathViolation::AbnormalPath {
                path: file.path.clone(),
            });
        }
        if !is_absolute_path(&file.path) {
            violations.push(PathViolation::RelativePath {
                path: file.path.clone(),
                role: PathRole::Source,
            });
        } else if !path_within_media_folder(&plan.media_folder_path, &file.path) {
            violations.push(PathViolation::OutsideMediaFolder {
                path: file.path.clone(),
                role: PathRole::Source,
            });
        }
        if file.episode == 0 {
            violations.push(PathViolation::InvalidEpisodeNumber {
                path: file.path.clone(),
            });
        }
        if !seen_paths.insert(file.path.as_str()) && reported_paths.insert(file.path.as_str()) {
            violations.push(PathViolation::DuplicatedSource {
                path: file.path.clone(),
            });
        }
        let key = (file.season, file.episode);
        if !seen_episodes.insert(key) && reported_episodes.insert(key) {
            violations.push(PathViolation::DuplicatedEpisode {
                season: file.season,
                episode: file.episode,
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::{RecognizedFile, RenameTask};

    #[test]
    fn test_valid_rename_plan() {
        let plan = RenameFilesPlan::new(
            "/media/Show",
            vec![RenameTask::new(
                "/media/Show/ep1.avi",
                "/media/Show/Season 01/Show - S01E01.avi",
            )],
        );
        assert!(validate_rename_plan(&plan).is_ok());
    }

    #[test]
    fn test_valid_recognize_plan() {
        let plan = RecognizeMediaFilePlan::new(
            "/media/Show",
            vec![
                RecognizedFile::new(1, 1, "/media/Show/ep1.mkv"),
                RecognizedFile::new(1, 2, "/media/Show/ep2.mkv"),
                RecognizedFile::new(0, 1, "/media/Show/special.mkv"),
            ],
        );
        assert!(validate_recognize_plan(&plan).is_ok());
    }

    #[test]
    fn test_recognize_plan_rejects_duplicates_and_episode_zero() {
        let plan = RecognizeMediaFilePlan::new(
            "/media/Show",
            vec![
                RecognizedFile::new(1, 1, "/media/Show/ep1.mkv"),
                RecognizedFile::new(1, 1, "/media/Show/ep1b.mkv"),
                RecognizedFile::new(1, 2, "/media/Show/ep1.mkv"),
                RecognizedFile::new(1, 0, "/media/Show/ep0.mkv"),
            ],
        );

        let report = validate_recognize_plan(&plan).unwrap_err();
        assert_eq!(
            report.violations,
            vec![
                PathViolation::DuplicatedEpisode {
                    season: 1,
                    episode: 1
                },
                PathViolation::DuplicatedSource {
                    path: "/media/Show/ep1.mkv".to_string()
                },
                PathViolation::InvalidEpisodeNumber {
                    path: "/media/Show/ep0.mkv".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_recognize_plan_rejects_outside_paths() {
        let plan = RecognizeMediaFilePlan::new(
            "/media/Show",
            vec![RecognizedFile::new(1, 1, "/media/Show/../Other/ep1.mkv")],
        );

        let report = validate_recognize_plan(&plan).unwrap_err();
        assert_eq!(report.violations.len(), 2);
        assert!(matches!(report.violations[0], PathViolation::AbnormalPath { .. }));
        assert!(matches!(
            report.violations[1],
            PathViolation::OutsideMediaFolder { .. }
        ));
    }

    #[test]
    fn test_recognize_plan_rejects_relative_paths() {
        let plan = RecognizeMediaFilePlan::new(
            "/media/Show",
            vec![RecognizedFile::new(1, 1, "Season 01/ep1.mkv")],
        );

        let report = validate_recognize_plan(&plan).unwrap_err();
        assert_eq!(
            report.violations,
            vec![PathViolation::RelativePath {
                path: "Season 01/ep1.mkv".to_string(),
                role: PathRole::Source,
            }]
        );
    }
}
