//! Paged collections returned by listing operations
//!
//! Extensions return either a fully materialised list or a loader that is
//! called with a continuation token until it reports no further page.

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::Result;

/// One page of results plus the token for the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token; `None` on the last page.
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<String>) -> Self {
        Self { items, next }
    }

    /// A page with nothing after it.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
        }
    }
}

type PageLoader<T> = Arc<dyn Fn(Option<String>) -> BoxFuture<'static, Result<Page<T>>> + Send + Sync>;

/// A lazily or eagerly available collection.
pub enum PagedData<T> {
    /// Everything is already in memory.
    Single(Vec<T>),
    /// Pages are fetched on demand with a continuation token.
    Continuous(PageLoader<T>),
}

/// Upper bound on pages fetched by [`PagedData::load_all`].
const MAX_PAGES: usize = 1_000;

impl<T: Send + 'static> PagedData<T> {
    pub fn single(items: Vec<T>) -> Self {
        PagedData::Single(items)
    }

    pub fn empty() -> Self {
        PagedData::Single(Vec::new())
    }

    /// Wrap a loader. It receives `None` for the first page and the
    /// previous page's `next` token afterwards.
    pub fn continuous<F, Fut>(loader: F) -> Self
    where
        F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>>> + Send + 'static,
    {
        PagedData::Continuous(Arc::new(move |token| Box::pin(loader(token))))
    }

    /// Load the page identified by `token` (`None` = first page).
    ///
    /// A `Single` collection is one page; asking it for a continuation
    /// returns an empty last page.
    pub async fn load_page(&self, token: Option<String>) -> Result<Page<T>>
    where
        T: Clone,
    {
        match self {
            PagedData::Single(items) => match token {
                None => Ok(Page::last(items.clone())),
                Some(_) => Ok(Page::last(Vec::new())),
            },
            PagedData::Continuous(loader) => loader(token).await,
        }
    }

    /// Load every page and concatenate the items.
    pub async fn load_all(self) -> Result<Vec<T>> {
        match self {
            PagedData::Single(items) => Ok(items),
            PagedData::Continuous(loader) => {
                let mut all = Vec::new();
                let mut token = None;
                for _ in 0..MAX_PAGES {
                    let page = loader(token).await?;
                    all.extend(page.items);
                    match page.next {
                        Some(next) => token = Some(next),
                        None => return Ok(all),
                    }
                }
                tracing::warn!(pages = MAX_PAGES, "Stopped paging after page limit");
                Ok(all)
            }
        }
    }
}

impl<T> Clone for PagedData<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            PagedData::Single(items) => PagedData::Single(items.clone()),
            PagedData::Continuous(loader) => PagedData::Continuous(Arc::clone(loader)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PagedData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagedData::Single(items) => f.debug_tuple("Single").field(items).finish(),
            PagedData::Continuous(_) => f.write_str("Continuous(..)"),
        }
    }
}
