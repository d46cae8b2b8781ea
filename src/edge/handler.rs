//! HTTP surface of the media-resolution service

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::edge::cache::{CacheError, MediaCache};
use crate::edge::resolver::NodeResolver;
use crate::health::HealthState;

/// Freshness window of a cached lookup
pub const MEDIA_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Node reported for media no resolver knows
pub const UNKNOWN_NODE: &str = "unknown";

const LOOKUP_FAILED: &str = "Failed to retrieve DNS information";

/// Response body of a media lookup
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MediaLocation {
    #[serde(rename = "mediaID")]
    pub media_id: String,
    #[serde(rename = "cdnNode")]
    pub cdn_node: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// Where a lookup found its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Cache,
    Resolver,
    Unknown,
}

impl LookupSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LookupSource::Cache => "cache",
            LookupSource::Resolver => "resolver",
            LookupSource::Unknown => "unknown",
        }
    }
}

/// Injected capabilities of the media service
#[derive(Clone)]
pub struct MediaState {
    resolver: Arc<dyn NodeResolver>,
    cache: Arc<dyn MediaCache>,
    health_state: Option<Arc<HealthState>>,
}

impl MediaState {
    pub fn new(resolver: Arc<dyn NodeResolver>, cache: Arc<dyn MediaCache>) -> Self {
        Self {
            resolver,
            cache,
            health_state: None,
        }
    }

    pub fn with_health_state(mut self, health_state: Arc<HealthState>) -> Self {
        self.health_state = Some(health_state);
        self
    }

    /// Resolve a media item: cache first, then the resolver.
    ///
    /// Resolved nodes are cached; unknown media is not. A failed cache
    /// write only loses the cache entry.
    pub async fn lookup(&self, media_id: &str) -> Result<(String, LookupSource), CacheError> {
        if let Some(node) = self.cache.get(media_id).await? {
            return Ok((node, LookupSource::Cache));
        }

        let Some(node) = self.resolver.resolve(media_id) else {
            return Ok((UNKNOWN_NODE.to_string(), LookupSource::Unknown));
        };

        if let Err(e) = self.cache.set(media_id, &node, MEDIA_CACHE_TTL).await {
            warn!(media_id, error = %e, "Failed to cache media lookup");
        }
        Ok((node, LookupSource::Resolver))
    }
}

async fn get_media(State(state): State<MediaState>, Path(media_id): Path<String>) -> Response {
    match state.lookup(&media_id).await {
        Ok((cdn_node, source)) => {
            if let Some(ref health) = state.health_state {
                health.metrics.record_media_lookup(source.as_str());
            }
            Json(MediaLocation { media_id, cdn_node }).into_response()
        }
        Err(e) => {
            error!(media_id = %media_id, error = %e, "Media cache lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: LOOKUP_FAILED.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Log every request and its response status
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let user_agent = req
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    info!(
        %method,
        %uri,
        user_agent,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Handled media request"
    );
    response
}

/// Create the media service router
pub fn create_media_router(state: MediaState) -> Router {
    Router::new()
        .route("/cdn/media/{media_id}", get(get_media))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Run the media service on `addr`
pub async fn run_media_server(state: MediaState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let app = create_media_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Media service listening on {}", addr);

    axum::serve(listener, app).await
}
