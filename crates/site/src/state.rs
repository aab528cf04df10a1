//! Application state shared across handlers.

use std::path::Path;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::{ContentError, ContentStore};
use crate::notify::{DeletionNotifier, LogNotifier};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    content: ContentStore,
    notifier: Arc<dyn DeletionNotifier>,
}

impl AppState {
    /// Create a new application state, loading content from `content_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content directory cannot be read.
    pub fn new(config: SiteConfig, content_dir: &Path) -> Result<Self, ContentError> {
        let content = ContentStore::load(content_dir)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                content,
                notifier: Arc::new(LogNotifier),
            }),
        })
    }

    /// Replace the deletion notifier (used by tests and future channels).
    #[must_use]
    pub fn with_notifier(self, notifier: Arc<dyn DeletionNotifier>) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(AppStateInner {
                config: inner.config.clone(),
                content: inner.content.clone(),
                notifier,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the content store.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Get a reference to the deletion notifier.
    #[must_use]
    pub fn notifier(&self) -> &dyn DeletionNotifier {
        self.inner.notifier.as_ref()
    }
}
