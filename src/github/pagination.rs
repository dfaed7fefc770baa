//! Cursor-driven traversal of paged listings.
//!
//! GitHub pages list endpoints and advertises the following page in the `Link`
//! response header:
//!
//! ```text
//! Link: <https://api.github.com/repos/o/r/issues?page=2&per_page=100>; rel="next",
//!       <https://api.github.com/repos/o/r/issues?page=5&per_page=100>; rel="last"
//! ```
//!
//! The `page` parameter of the `next` link becomes the next [`PageCursor`]. A
//! missing `next` relation ends the walk. So does a `Link` header that cannot
//! be understood: a malformed header truncates the listing instead of failing
//! it or looping forever.
//!
//! [`paginate`] holds no state besides the cursor and the items gathered so
//! far, so any listing can start from any cursor.

use std::future::Future;

/// Number of items requested per page for every listing.
pub const PER_PAGE: u32 = 100;

/// Position of a page in a GitHub listing (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageCursor(u32);

impl PageCursor {
    /// The first page.
    pub fn first() -> Self {
        PageCursor(1)
    }

    /// A cursor at `page`; page numbers start at 1.
    pub fn at(page: u32) -> Option<Self> {
        (page > 0).then_some(PageCursor(page))
    }

    pub fn page(&self) -> u32 {
        self.0
    }

    /// Reads the `rel="next"` target from a `Link` header value.
    ///
    /// Returns `None` when there is no next page, and also when the header is
    /// malformed.
    ///
    /// ```
    /// use github_robot::github::PageCursor;
    ///
    /// let link = r#"<https://api.github.com/x?page=3&per_page=100>; rel="next""#;
    /// assert_eq!(PageCursor::from_link_header(link), PageCursor::at(3));
    /// assert_eq!(PageCursor::from_link_header("garbage"), None);
    /// ```
    pub fn from_link_header(value: &str) -> Option<Self> {
        value
            .split(',')
            .filter_map(parse_link)
            .find(|(_, rel)| rel.split_whitespace().any(|r| r == "next"))
            .and_then(|(url, _)| page_param(url))
            .and_then(PageCursor::at)
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::first()
    }
}

/// Splits one `<url>; rel="..."` entry into its URL and relation.
fn parse_link(entry: &str) -> Option<(&str, &str)> {
    let mut parts = entry.trim().split(';');
    let url = parts
        .next()?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')?;
    let rel = parts.find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        (key.trim() == "rel").then(|| value.trim().trim_matches('"'))
    })?;
    Some((url, rel))
}

fn page_param(url: &str) -> Option<u32> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("page="))
        .and_then(|page| page.parse().ok())
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T, C = PageCursor> {
    pub items: Vec<T>,
    /// Where the following page starts; `None` ends the traversal.
    pub next: Option<C>,
}

/// Everything a traversal collected, plus the error that stopped it early.
#[derive(Debug)]
pub struct Traversal<T, E> {
    /// Items from every fetched page, in response order.
    pub items: Vec<T>,
    pub error: Option<E>,
}

impl<T, E> Traversal<T, E> {
    /// True if the listing was walked to its last page.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Discards partial results on failure.
    pub fn into_result(self) -> Result<Vec<T>, E> {
        match self.error {
            None => Ok(self.items),
            Some(e) => Err(e),
        }
    }

    pub fn into_parts(self) -> (Vec<T>, Option<E>) {
        (self.items, self.error)
    }
}

/// Walks a paged listing from `start` until a page has no successor.
///
/// `fetch` is called once per page, in order. The first failing fetch stops
/// the walk; the items gathered before it are returned with the error and
/// `fetch` is not called again.
pub async fn paginate<T, C, E, F, Fut>(start: C, mut fetch: F) -> Traversal<T, E>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<Page<T, C>, E>>,
{
    let mut items = Vec::new();
    let mut cursor = Some(start);

    while let Some(current) = cursor.take() {
        match fetch(current).await {
            Ok(page) => {
                items.extend(page.items);
                cursor = page.next;
            }
            Err(e) => {
                return Traversal {
                    items,
                    error: Some(e),
                };
            }
        }
    }

    Traversal { items, error: None }
}
