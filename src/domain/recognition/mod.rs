// src/domain/recognition/mod.rs
//
// Recognition Domain
//
// Value objects for matching candidate files against a media item's
// episode catalog. Matching itself lives in the EpisodeMatcher service.

pub mod value_objects;

pub use value_objects::{
    CatalogEpisode, CatalogSeason, EpisodeCatalog, EpisodeMatch, MatchConvention,
};
