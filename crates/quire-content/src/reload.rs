use std::sync::Arc;

use async_trait::async_trait;
use quire_digest::digest_str;
use tracing::debug;

use crate::config::ContentConfig;
use crate::error::ContentResult;
use crate::observer::{ContentConfigState, ContentObservable};

/// A content config together with the text it was parsed from.
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub config: ContentConfig,
    pub source_text: String,
}

/// Where content configs come from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Parse the current config. `Ok(None)` means there is none.
    async fn load(&self) -> ContentResult<Option<LoadedConfig>>;
}

/// Reload the config from `source` and publish each step to `observer`.
///
/// The loaded config's digest is computed from its source text, so an
/// unchanged file yields an unchanged digest.
pub async fn reload_content_config_observer(
    observer: &ContentObservable,
    source: &dyn ConfigSource,
) {
    observer.set(ContentConfigState::Loading);
    let state = match source.load().await {
        Ok(Some(LoadedConfig {
            mut config,
            source_text,
        })) => {
            config.digest = Some(digest_str(&source_text));
            ContentConfigState::Loaded(Arc::new(config))
        }
        Ok(None) => ContentConfigState::DoesNotExist,
        Err(e) => ContentConfigState::Error(Arc::new(e.into_domain())),
    };
    debug!(status = state.status(), "content config reloaded");
    observer.set(state);
}
