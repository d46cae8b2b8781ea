//! Media-resolution service: maps a media id to the CDN node serving it

pub mod cache;
pub mod handler;
pub mod resolver;

pub use cache::{CacheError, InMemoryMediaCache, MediaCache};
pub use handler::{
    LookupSource, MEDIA_CACHE_TTL, MediaLocation, MediaState, UNKNOWN_NODE, create_media_router,
    run_media_server,
};
pub use resolver::{NodeResolver, StaticNodeTable};
