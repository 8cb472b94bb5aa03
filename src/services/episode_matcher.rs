// src/services/episode_matcher.rs
//
// Episode Matcher
//
// Maps candidate video files onto a media item's episode catalog.
//
// CRITICAL RULES:
// - Pure: no I/O, no repositories, no events
// - Deterministic: identical input → identical output, whatever the file order
// - One entry per catalog episode with a matched file, in catalog order
// - Unmatched episodes are skipped, never an error
// - Empty catalog or empty file list → empty result
//
// PRECEDENCE (first rule that parses a file wins for that file):
// 1. `S01E02`                       → season 1, episode 2
// 2. `1x02`                         → season 1, episode 2
// 3. episode marker or number inside a `Season N` / `SNN` / `Specials` folder
// 4. episode marker or number with no season information → season 1
// When several files claim the same episode, the one parsed by the
// higher-precedence rule wins, then the lexicographically smallest path.

use std::collections::HashMap;

use regex::Regex;

use crate::domain::naming::{has_video_extension, DEFAULT_VIDEO_EXTENSIONS};
use crate::domain::path_safety::to_posix;
use crate::domain::recognition::MatchConvention;
use crate::domain::{EpisodeCatalog, EpisodeMatch};

// ============================================================================
// MATCH RULES (DETERMINISTIC, LAYERED)
// ============================================================================

/// Filename conventions, ordered by precedence.
pub struct MatchRules {
    /// Release-group tags, resolutions, years: `[Group]`, `(2019)`
    noise: Regex,

    /// `S01E02`, `s1.e02`, `S01 E02`
    season_episode: Regex,

    /// `1x02`
    cross_notation: Regex,

    /// `Episode 02`, `EP02`, `E02`, `- 02`, `#02`
    episode_markers: Vec<Regex>,

    /// A standalone 1-3 digit number
    bare_number: Regex,

    /// `Season 1`, `Series 01`, `S01`
    season_folder: Regex,

    /// `Specials`, `Special`
    specials_folder: Regex,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            noise: pattern("noise", r"\[[^\]]*\]|\([^)]*\)"),
            season_episode: pattern("season_episode", r"(?i)(?:^|[^a-z0-9])s(\d{1,3})[ ._-]?e(\d{1,4})(?:[^0-9]|$)"),
            cross_notation: pattern("cross_notation", r"(?i)(?:^|[^a-z0-9])(\d{1,2})x(\d{2,3})(?:[^0-9]|$)"),
            episode_markers: vec![
                pattern("episode_markers", r"(?i)(?:^|[^a-z0-9])(?:episode|ep|e)[ ._-]?(\d{1,4})(?:[^0-9]|$)"),
                pattern("episode_markers", r"-\s*(\d{1,4})(?:\s|\.|$)"),
                pattern("episode_markers", r"#(\d{1,4})(?:[^0-9]|$)"),
            ],
            bare_number: pattern("bare_number", r"(?:^|[ ._])(\d{1,3})(?:[ ._]|$)"),
            season_folder: pattern("season_folder", r"(?i)^(?:season|series|s)[ ._-]?(\d{1,3})$"),
            specials_folder: pattern("specials_folder", r"(?i)^specials?$"),
        }
    }
}

fn pattern(field: &str, source: &str) -> Regex {
    Regex::new(source)
        .unwrap_or_else(|e| panic!("built-in match rule `{}` is not a valid regex: {}", field, e))
}

/// One file's parsed numbering
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    season: u32,
    episode: u32,
    convention: MatchConvention,
    path: String,
}

impl MatchRules {
    /// Parse `(season, episode, convention)` from a POSIX path.
    pub fn parse(&self, path: &str) -> Option<(u32, u32, MatchConvention)> {
        let posix = to_posix(path);
        let mut segments = posix.rsplit('/');
        let file_name = segments.next()?;
        let parent = segments.next().unwrap_or("");

        let stem = file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(file_name);
        let cleaned = self.noise.replace_all(stem, " ");
        let cleaned = cleaned.trim();

        if let Some((season, episode)) = capture_pair(&self.season_episode, cleaned) {
            return Some((season, episode, MatchConvention::SeasonEpisode));
        }
        if let Some((season, episode)) = capture_pair(&self.cross_notation, cleaned) {
            return Some((season, episode, MatchConvention::CrossNotation));
        }

        let episode = self
            .episode_markers
            .iter()
            .find_map(|re| capture_number(re, cleaned))
            .or_else(|| capture_number(&self.bare_number, cleaned))?;

        match self.season_from_folder(parent) {
            Some(season) => Some((season, episode, MatchConvention::EpisodeInSeasonFolder)),
            None => Some((1, episode, MatchConvention::BareEpisode)),
        }
    }

    fn season_from_folder(&self, folder: &str) -> Option<u32> {
        let folder = folder.trim();
        if self.specials_folder.is_match(folder) {
            return Some(0);
        }
        capture_number(&self.season_folder, folder)
    }
}

fn capture_pair(re: &Regex, text: &str) -> Option<(u32, u32)> {
    let caps = re.captures(text)?;
    let season = caps.get(1)?.as_str().parse().ok()?;
    let episode = caps.get(2)?.as_str().parse().ok()?;
    Some((season, episode))
}

fn capture_number(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

// ============================================================================
// EPISODE MATCHER
// ============================================================================

/// Matches computed once for a catalog and a file list.
///
/// `iter()` walks the catalog lazily and can be called any number of times;
/// every call yields the same sequence.
pub struct EpisodeMatcher<'a> {
    catalog: &'a EpisodeCatalog,
    best: HashMap<(u32, u32), Candidate>,
}

impl<'a> EpisodeMatcher<'a> {
    /// Match with the built-in rules and video extensions
    pub fn new<S: AsRef<str>>(catalog: &'a EpisodeCatalog, files: &[S]) -> Self {
        Self::with_rules(catalog, files, &MatchRules::default(), DEFAULT_VIDEO_EXTENSIONS)
    }

    pub fn with_rules<S: AsRef<str>, E: AsRef<str>>(
        catalog: &'a EpisodeCatalog,
        files: &[S],
        rules: &MatchRules,
        video_extensions: &[E],
    ) -> Self {
        let mut best: HashMap<(u32, u32), Candidate> = HashMap::new();

        if !catalog.is_empty() {
            for file in files {
                let path = to_posix(file.as_ref());
                if !has_video_extension(&path, video_extensions) {
                    continue;
                }
                let Some((season, episode, convention)) = rules.parse(&path) else {
                    log::debug!("No episode numbering recognized in {}", path);
                    continue;
                };

                let candidate = Candidate {
                    season,
                    episode,
                    convention,
                    path,
                };
                best.entry((season, episode))
                    .and_modify(|current| {
                        if (candidate.convention, &candidate.path)
                            < (current.convention, &current.path)
                        {
                            *current = candidate.clone();
                        }
                    })
                    .or_insert_with(|| candidate.clone());
            }
        }

        Self { catalog, best }
    }

    /// Catalog-ordered matches, skipping episodes without a file
    pub fn iter(&self) -> impl Iterator<Item = EpisodeMatch> + '_ {
        self.catalog.seasons.iter().flat_map(move |season| {
            season.episodes.iter().filter_map(move |episode| {
                self.best
                    .get(&(season.season_number, episode.episode_number))
                    .map(|candidate| EpisodeMatch {
                        season: candidate.season,
                        episode: candidate.episode,
                        video_file_path: candidate.path.clone(),
                    })
            })
        })
    }

    pub fn matches(&self) -> Vec<EpisodeMatch> {
        self.iter().collect()
    }
}

/// Convenience wrapper over `EpisodeMatcher::new(..).matches()`
pub fn match_episodes<S: AsRef<str>>(catalog: &EpisodeCatalog, files: &[S]) -> Vec<EpisodeMatch> {
    EpisodeMatcher::new(catalog, files).matches()
}
