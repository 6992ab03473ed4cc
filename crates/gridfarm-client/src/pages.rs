//! Cache-ahead iteration over paginated collections.
//!
//! [`Pages`] turns a list call into a sequence of single records. It holds at
//! most one page in memory and only asks for the next page once the cached
//! one is used up. A page shorter than the requested size is the last one, so
//! no extra request is made to discover the end; an empty page also ends the
//! sequence.
//!
//! A failed fetch is yielded as `Some(Err(..))` and leaves the cursor where it
//! was: calling `next` again retries the same page. The sequence is single
//! pass. Build a new one to scan again.

use std::fmt;
use std::vec;

use tracing::debug;

use crate::error::ClientResult;
use crate::pager::Pager;

type FetchPage<'a, T> = Box<dyn FnMut(Pager) -> ClientResult<Vec<T>> + Send + 'a>;

/// Lazy, finite sequence of records fetched one page at a time.
pub struct Pages<'a, T> {
    fetch: FetchPage<'a, T>,
    page: u32,
    size: u32,
    cache: vec::IntoIter<T>,
    exhausted: bool,
}

impl<'a, T> Pages<'a, T> {
    /// Iterate over whatever `fetch` returns for pages 1, 2, ... of
    /// `page_size` records (0 means the default size).
    pub fn new<F>(page_size: u32, fetch: F) -> Self
    where
        F: FnMut(Pager) -> ClientResult<Vec<T>> + Send + 'a,
    {
        let first = Pager::new(1, page_size);
        Self {
            fetch: Box::new(fetch),
            page: first.page(),
            size: first.size(),
            cache: Vec::new().into_iter(),
            exhausted: false,
        }
    }

    /// Next page number that will be requested.
    pub fn next_page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.size
    }

    /// Whether the server collection has been fully fetched.
    ///
    /// Cached records may still be pending.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn fill(&mut self) -> ClientResult<bool> {
        let pager = Pager::new(self.page, self.size);
        let items = (self.fetch)(pager)?;
        debug!(page = pager.page(), size = pager.size(), fetched = items.len(), "fetched page");

        if items.is_empty() {
            self.exhausted = true;
            return Ok(false);
        }

        if items.len() < self.size as usize {
            self.exhausted = true;
        }
        self.page = self.page.saturating_add(1);
        self.cache = items.into_iter();
        Ok(true)
    }
}

impl<T> Iterator for Pages<'_, T> {
    type Item = ClientResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.cache.next() {
            return Some(Ok(item));
        }
        if self.exhausted {
            return None;
        }

        match self.fill() {
            Ok(true) => self.cache.next().map(Ok),
            Ok(false) => {
                debug!(page = self.page, "collection exhausted");
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl<T> fmt::Debug for Pages<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pages")
            .field("page", &self.page)
            .field("size", &self.size)
            .field("cached", &self.cache.len())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
