// src/domain/recognition/value_objects.rs
//
// Recognition Value Objects
//
// Pure, immutable data describing what a media item should contain and
// which files were matched to it.
//
// CRITICAL INVARIANTS:
// - Catalog order is the iteration order of every match result
// - No I/O, no persistence

use serde::{Deserialize, Serialize};

// ============================================================================
// EPISODE CATALOG
// ============================================================================

/// The known episode list of a media item, as provided by the metadata
/// collaborator. Seasons and episodes are kept in the given order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCatalog {
    pub seasons: Vec<CatalogSeason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeason {
    /// Season 0 holds specials
    pub season_number: u32,
    pub episodes: Vec<CatalogEpisode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEpisode {
    pub episode_number: u32,
    pub title: Option<String>,
}

impl EpisodeCatalog {
    pub fn new(seasons: Vec<CatalogSeason>) -> Self {
        Self { seasons }
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.iter().all(|s| s.episodes.is_empty())
    }

    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

impl CatalogSeason {
    /// Season with episodes numbered `1..=count`
    pub fn numbered(season_number: u32, count: u32) -> Self {
        Self {
            season_number,
            episodes: (1..=count)
                .map(|episode_number| CatalogEpisode {
                    episode_number,
                    title: None,
                })
                .collect(),
        }
    }
}

// ============================================================================
// MATCH RESULT
// ============================================================================

/// A catalog episode paired with the file recognized for it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeMatch {
    pub season: u32,
    pub episode: u32,
    pub video_file_path: String,
}

/// Which filename convention produced a candidate.
/// Declaration order is the precedence order used to break ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConvention {
    /// `S01E02`
    SeasonEpisode,
    /// `1x02`
    CrossNotation,
    /// `Episode 02`, `EP02`, `E02`, `- 02` with the season taken from a
    /// `Season 1` / `S01` / `Specials` folder
    EpisodeInSeasonFolder,
    /// Bare episode number with no season information
    BareEpisode,
}
