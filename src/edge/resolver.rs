//! Media-to-node resolution

use std::collections::HashMap;

/// Resolves which CDN node serves a media item
#[cfg_attr(test, mockall::automock)]
pub trait NodeResolver: Send + Sync {
    /// Node for `media_id`, `None` if the media is not known
    fn resolve(&self, media_id: &str) -> Option<String>;
}

/// Fixed media-to-node table
#[derive(Clone, Debug)]
pub struct StaticNodeTable {
    entries: HashMap<String, String>,
}

impl StaticNodeTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Default for StaticNodeTable {
    fn default() -> Self {
        Self::new([
            ("media1", "cdn-node-1"),
            ("media2", "cdn-node-2"),
            ("media3", "cdn-node-3"),
        ])
    }
}

impl NodeResolver for StaticNodeTable {
    fn resolve(&self, media_id: &str) -> Option<String> {
        self.entries.get(media_id).cloned()
    }
}
