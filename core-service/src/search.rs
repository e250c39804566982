//! Search against the currently selected extension.
//!
//! Holds the query and genre filter of the search screen, the genre list of
//! the last refresh and the latest quick-search suggestions. Genre and
//! suggestion lookups degrade to empty lists on failure; only the absence of
//! a search-capable extension is an error.

use core_extension::{
    ExtensionRegistry, Genre, MediaItemsContainer, PagedData, QuickSearchItem, SearchClient,
    SharedExtension,
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::error::{CoreError, Result};

pub struct SearchController {
    registry: Arc<ExtensionRegistry>,
    query: RwLock<Option<String>>,
    genre: watch::Sender<Option<Genre>>,
    genres: watch::Sender<Vec<Genre>>,
    quick_results: watch::Sender<Vec<QuickSearchItem>>,
    loading: watch::Sender<bool>,
}

impl SearchController {
    pub fn new(registry: Arc<ExtensionRegistry>) -> Self {
        Self {
            registry,
            query: RwLock::new(None),
            genre: watch::channel(None).0,
            genres: watch::channel(Vec::new()).0,
            quick_results: watch::channel(Vec::new()).0,
            loading: watch::channel(false).0,
        }
    }

    fn search_extension(&self) -> Result<SharedExtension> {
        let extension = self.registry.current().ok_or(CoreError::NoExtensionSelected)?;
        if extension.as_search_client().is_none() {
            return Err(CoreError::CapabilityMissing {
                capability: "search".to_string(),
                message: format!("{} does not support search", extension.name()),
            });
        }
        Ok(extension)
    }

    pub fn query(&self) -> Option<String> {
        self.query.read().clone()
    }

    /// Blank queries count as no query.
    pub fn set_query(&self, query: Option<String>) {
        *self.query.write() = query.filter(|q| !q.trim().is_empty());
    }

    pub fn genre(&self) -> Option<Genre> {
        self.genre.borrow().clone()
    }

    pub fn genres(&self) -> Vec<Genre> {
        self.genres.borrow().clone()
    }

    /// Refresh genres and return the search feed for the current query.
    ///
    /// Genres are reloaded when `reset` is set or none are known yet; the
    /// first genre then becomes the filter unless the current one is still
    /// listed.
    #[instrument(skip(self))]
    pub async fn refresh(&self, reset: bool) -> Result<PagedData<MediaItemsContainer>> {
        let extension = self.search_extension()?;
        let Some(client) = extension.as_search_client() else {
            return Err(CoreError::NoExtensionSelected);
        };
        let query = self.query();

        if reset || self.genres.borrow().is_empty() {
            self.loading.send_replace(true);
            let genres = load_genres(client, query.as_deref()).await;
            self.loading.send_replace(false);

            let current = self.genre();
            let genre = match current {
                Some(current) if !reset && genres.contains(&current) => Some(current),
                _ => genres.first().cloned(),
            };
            debug!(genres = genres.len(), genre = ?genre.as_ref().map(|g| &g.name), "Search genres loaded");
            self.genres.send_replace(genres);
            self.genre.send_replace(genre);
        }

        let genre = self.genre();
        Ok(client.search(query.as_deref(), genre.as_ref()))
    }

    /// Change the genre filter and return the refreshed feed.
    pub async fn set_genre(&self, genre: Option<Genre>) -> Result<PagedData<MediaItemsContainer>> {
        self.genre.send_replace(genre);
        self.refresh(false).await
    }

    /// Suggestions for `query`. Failures yield no suggestions.
    #[instrument(skip(self))]
    pub async fn quick_search(&self, query: Option<&str>) -> Vec<QuickSearchItem> {
        let results = match self.search_extension() {
            Ok(extension) => match extension.as_search_client() {
                Some(client) => client.quick_search(query).await.unwrap_or_else(|error| {
                    warn!(error = %error, "Quick search failed");
                    Vec::new()
                }),
                None => Vec::new(),
            },
            Err(error) => {
                debug!(error = %error, "Quick search skipped");
                Vec::new()
            }
        };
        self.quick_results.send_replace(results.clone());
        results
    }

    pub fn subscribe_genre(&self) -> watch::Receiver<Option<Genre>> {
        self.genre.subscribe()
    }

    pub fn subscribe_genres(&self) -> watch::Receiver<Vec<Genre>> {
        self.genres.subscribe()
    }

    pub fn subscribe_quick_results(&self) -> watch::Receiver<Vec<QuickSearchItem>> {
        self.quick_results.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }
}

async fn load_genres(client: &dyn SearchClient, query: Option<&str>) -> Vec<Genre> {
    match client.search_genres(query).await {
        Ok(genres) => genres,
        Err(error) => {
            warn!(error = %error, "Failed to load search genres");
            Vec::new()
        }
    }
}

impl fmt::Debug for SearchController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchController")
            .field("query", &*self.query.read())
            .field("genre", &*self.genre.borrow())
            .finish()
    }
}
