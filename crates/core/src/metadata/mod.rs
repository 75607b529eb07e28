//! External metadata lookup.
//!
//! Maps IMDb-style ids to titles, show details and trending lists. The
//! pipeline and the trending feeder only see the [`MetadataProvider`]
//! trait; TMDB is the production backend.

mod tmdb;
mod types;

pub use tmdb::{TmdbConfig, TmdbProvider};
pub use types::{
    MetadataError, MetadataProvider, ShowDetails, TitleMetadata, TrendingItem,
};
