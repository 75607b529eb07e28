pub mod cache;
pub mod config;
pub mod debrid;
pub mod matcher;
pub mod metadata;
pub mod pipeline;
pub mod scraper;
pub mod selector;
pub mod stream;
pub mod testing;
pub mod torrent;
pub mod worker;

pub use cache::{CacheError, CacheStats, CacheStore};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use debrid::{
    CacheCheck, CachedFileInfo, DebridClient, DebridError, TorBoxClient, TorBoxConfig,
};
pub use metadata::{
    MetadataError, MetadataProvider, ShowDetails, TitleMetadata, TmdbConfig, TmdbProvider,
    TrendingItem,
};
pub use pipeline::{PipelineConfig, StreamPipeline};
pub use scraper::{
    HttpTorrentManager, Indexer, IndexerResult, JackettClient, JackettScraper, ResolvedHash,
    ScrapeError, ScrapeRequest, Torrent, TorrentDownload, TorrentManager,
};
pub use stream::{
    BehaviorHints, MediaKind, StreamOutput, StreamRequest, StreamResponse, ADDON_NAME,
};
pub use torrent::{TorrentError, TorrentMetadata};
pub use worker::{
    BackgroundTask, SearchFn, TaskDeduplicator, TaskKind, TrendingFeeder, TrendingFeederConfig,
    WorkerPool, WorkerPoolConfig,
};
