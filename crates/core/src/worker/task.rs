//! Background task model.

/// What a background task does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    SeriesPrefetch,
    MoviePrefetch,
    TrendingPrefetch,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::SeriesPrefetch => "series-prefetch",
            TaskKind::MoviePrefetch => "movie-prefetch",
            TaskKind::TrendingPrefetch => "trending-prefetch",
        }
    }
}

/// Priority 0 is user-triggered work, 1 is trending backfill.
pub const PRIORITY_USER: u8 = 0;
pub const PRIORITY_TRENDING: u8 = 1;

/// A unit of background work, consumed exactly once by a worker.
#[derive(Debug, Clone)]
pub struct BackgroundTask {
    pub kind: TaskKind,
    /// Internal id used for deduplication (the metadata provider id).
    pub id: String,
    /// IMDb-style external id.
    pub external_id: String,
    pub title: String,
    pub year: String,
    /// Known season count; series prefetch only.
    pub total_seasons: u32,
    pub priority: u8,
}
