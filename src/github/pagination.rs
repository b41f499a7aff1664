//! Page-by-page iteration over GitHub list endpoints.
//!
//! GitHub's list and search endpoints return at most 100 items per page.
//! [`Paginator`] walks the pages lazily and stops at the first short page or
//! when the configured page limit is reached. The page bookkeeping lives in
//! [`PageCursor`], which performs no I/O.

use std::marker::PhantomData;

use octocrab::Octocrab;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::error::GitHubApiError;

/// Page size and page count limits for one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Items requested per page (GitHub caps this at 100).
    pub per_page: u8,
    /// Maximum number of pages fetched before giving up.
    pub max_pages: u32,
}

impl PageLimits {
    pub const DEFAULT: Self = Self {
        per_page: 100,
        max_pages: 10,
    };

    pub fn new(per_page: u8, max_pages: u32) -> Self {
        Self {
            per_page: per_page.clamp(1, 100),
            max_pages: max_pages.max(1),
        }
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Tracks which page to request next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    limits: PageLimits,
    next_page: Option<u32>,
    truncated: bool,
}

impl PageCursor {
    pub fn new(limits: PageLimits) -> Self {
        Self {
            limits,
            next_page: Some(1),
            truncated: false,
        }
    }

    /// The 1-based page to fetch next, or `None` once the listing is done.
    pub fn next_page(&self) -> Option<u32> {
        self.next_page
    }

    /// Records that `page` returned `item_count` items.
    pub fn record(&mut self, page: u32, item_count: usize) {
        if item_count < usize::from(self.limits.per_page) {
            self.next_page = None;
        } else if page >= self.limits.max_pages {
            self.next_page = None;
            self.truncated = true;
        } else {
            self.next_page = Some(page + 1);
        }
    }

    /// True if the page limit stopped the listing before a short page was seen.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Starts over from the first page.
    pub fn restart(&mut self) {
        *self = Self::new(self.limits);
    }
}

/// A response body that carries one page of items.
pub trait PageBody<T>: DeserializeOwned {
    fn into_items(self) -> Vec<T>;

    /// True if GitHub reported that the page itself is incomplete.
    fn incomplete(&self) -> bool {
        false
    }
}

impl<T: DeserializeOwned> PageBody<T> for Vec<T> {
    fn into_items(self) -> Vec<T> {
        self
    }
}

/// Body of a `/search/*` response.
#[derive(Debug, Deserialize)]
pub struct SearchPage<T> {
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<T>,
}

impl<T: DeserializeOwned> PageBody<T> for SearchPage<T> {
    fn into_items(self) -> Vec<T> {
        self.items
    }

    fn incomplete(&self) -> bool {
        self.incomplete_results
    }
}

/// Everything a [`Paginator`] collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected<T> {
    pub items: Vec<T>,
    /// Set when the page limit was hit or GitHub flagged a page as incomplete.
    pub may_be_incomplete: bool,
}

/// Lazily fetches the pages of one GitHub listing.
///
/// # Example
///
/// ```ignore
/// let mut pages = Paginator::<RawLabel, Vec<RawLabel>>::new(octocrab, "/repos/o/r/labels", limits);
/// while let Some(labels) = pages.next_page().await? {
///     // ...
/// }
/// ```
pub struct Paginator<'a, T, B = Vec<T>> {
    client: &'a Octocrab,
    route: String,
    params: Vec<(String, String)>,
    cursor: PageCursor,
    incomplete: bool,
    _item: PhantomData<fn() -> (T, B)>,
}

impl<'a, T, B> Paginator<'a, T, B>
where
    T: DeserializeOwned,
    B: PageBody<T>,
{
    pub fn new(client: &'a Octocrab, route: impl Into<String>, limits: PageLimits) -> Self {
        Self {
            client,
            route: route.into(),
            params: Vec::new(),
            cursor: PageCursor::new(limits),
            incomplete: false,
            _item: PhantomData,
        }
    }

    /// Adds a query parameter sent with every page request.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Fetches the next page, or returns `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, GitHubApiError> {
        let Some(page) = self.cursor.next_page() else {
            return Ok(None);
        };

        let mut params = self.params.clone();
        params.push(("per_page".to_string(), self.cursor.limits.per_page.to_string()));
        params.push(("page".to_string(), page.to_string()));

        let body: B = self
            .client
            .get(&self.route, Some(&params))
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        self.incomplete |= body.incomplete();
        let items = body.into_items();
        self.cursor.record(page, items.len());
        Ok(Some(items))
    }

    /// Rewinds to the first page so the listing can be walked again.
    pub fn restart(&mut self) {
        self.cursor.restart();
        self.incomplete = false;
    }

    /// Walks all remaining pages.
    pub async fn collect_all(mut self) -> Result<Collected<T>, GitHubApiError> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }

        if self.cursor.truncated() {
            tracing::warn!(
                route = %self.route,
                items = items.len(),
                "Hit pagination limit; results may be incomplete"
            );
        }

        Ok(Collected {
            items,
            may_be_incomplete: self.cursor.truncated() || self.incomplete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CapturedRequest, MockGitHubApi};
    use serde_json::{Value, json};

    #[test]
    fn short_first_page_ends_listing() {
        let mut cursor = PageCursor::new(PageLimits::new(100, 10));
        assert_eq!(cursor.next_page(), Some(1));
        cursor.record(1, 42);
        assert_eq!(cursor.next_page(), None);
        assert!(!cursor.truncated());
    }

    #[test]
    fn full_pages_continue_until_short_page() {
        let mut cursor = PageCursor::new(PageLimits::new(2, 10));
        cursor.record(1, 2);
        assert_eq!(cursor.next_page(), Some(2));
        cursor.record(2, 2);
        assert_eq!(cursor.next_page(), Some(3));
        cursor.record(3, 0);
        assert_eq!(cursor.next_page(), None);
        assert!(!cursor.truncated());
    }

    #[test]
    fn page_limit_marks_truncation() {
        let mut cursor = PageCursor::new(PageLimits::new(2, 2));
        cursor.record(1, 2);
        cursor.record(2, 2);
        assert_eq!(cursor.next_page(), None);
        assert!(cursor.truncated());
    }

    #[test]
    fn restart_rewinds_to_first_page() {
        let mut cursor = PageCursor::new(PageLimits::new(2, 1));
        cursor.record(1, 2);
        assert!(cursor.truncated());

        cursor.restart();
        assert_eq!(cursor.next_page(), Some(1));
        assert!(!cursor.truncated());
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(PageLimits::new(0, 0), PageLimits::new(1, 1));
        assert_eq!(PageLimits::new(255, 3).per_page, 100);
    }

    #[test]
    fn search_page_body_reports_incomplete() {
        let body: SearchPage<serde_json::Value> = serde_json::from_str(
            r#"{"total_count": 2, "incomplete_results": true, "items": [{"number": 1}, {"number": 2}]}"#,
        )
        .unwrap();
        assert!(body.incomplete());
        assert_eq!(body.into_items().len(), 2);
    }

    // ─── Paginator over HTTP ───

    /// Every page is full, so only the page limit ends a listing.
    fn endless_listing(request: &CapturedRequest) -> Value {
        let first = (request.page() - 1) * request.per_page();
        json!((first..first + request.per_page()).collect::<Vec<_>>())
    }

    fn pages_requested(api: &MockGitHubApi) -> Vec<usize> {
        api.requests().iter().map(CapturedRequest::page).collect()
    }

    #[tokio::test]
    async fn collect_all_stops_at_page_limit() {
        let api = MockGitHubApi::start(endless_listing).await;
        let octocrab = api.octocrab();

        let collected = Paginator::<u64>::new(&octocrab, "/repos/o/r/labels", PageLimits::new(2, 3))
            .collect_all()
            .await
            .unwrap();

        assert_eq!(collected.items, vec![0, 1, 2, 3, 4, 5]);
        assert!(collected.may_be_incomplete);
        assert_eq!(pages_requested(&api), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn next_page_restarts_from_first_page() {
        let api = MockGitHubApi::start(endless_listing).await;
        let octocrab = api.octocrab();
        let mut pages = Paginator::<u64>::new(&octocrab, "/repos/o/r/labels", PageLimits::new(2, 2));

        assert_eq!(pages.next_page().await.unwrap(), Some(vec![0, 1]));
        assert_eq!(pages.next_page().await.unwrap(), Some(vec![2, 3]));
        assert_eq!(pages.next_page().await.unwrap(), None);

        pages.restart();
        assert_eq!(pages.next_page().await.unwrap(), Some(vec![0, 1]));
        assert_eq!(pages_requested(&api), vec![1, 2, 1]);
    }

    #[tokio::test]
    async fn search_params_and_incomplete_flag_are_carried() {
        let api = MockGitHubApi::start(|_: &CapturedRequest| {
            json!({ "incomplete_results": true, "items": [7] })
        })
        .await;
        let octocrab = api.octocrab();

        let collected = Paginator::<u64, SearchPage<u64>>::new(
            &octocrab,
            "/search/issues",
            PageLimits::DEFAULT,
        )
        .with_param("q", "is:issue label:accepted")
        .collect_all()
        .await
        .unwrap();

        assert_eq!(collected.items, vec![7]);
        assert!(collected.may_be_incomplete);
        let requests = api.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query["q"], "is:issue label:accepted");
    }
}
