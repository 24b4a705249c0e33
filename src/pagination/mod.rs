//! Pagination support for list endpoints.
//!
//! List endpoints wrap their items in a `{previous, next, results}`
//! envelope where `previous`/`next` are absolute URLs. [`Page`]
//! deserializes the envelope; [`PageIterator`] walks the `next` links.

use serde::Deserialize;

use crate::errors::ChronoResult;

/// A single page of results in the provider's list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// URL of the previous page, if any.
    pub previous: Option<String>,
    /// URL of the next page, if any.
    pub next: Option<String>,
    /// The items in this page.
    #[serde(default)]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Returns true if there is a next page.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Returns the URL for the next page.
    pub fn next_url(&self) -> Option<&str> {
        self.next.as_deref()
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if this page has no items.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consumes the page and returns the items.
    pub fn into_results(self) -> Vec<T> {
        self.results
    }

    /// Maps the items in this page.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            previous: self.previous,
            next: self.next,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Common query parameters for list requests.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    page_size: Option<u32>,
    since: Option<String>,
    extra: Vec<(String, String)>,
}

impl ListParams {
    /// Creates empty list parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of items per page.
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Restricts results to records modified at or after the given
    /// timestamp, in the format the endpoint expects.
    pub fn since(mut self, since: impl Into<String>) -> Self {
        self.since = Some(since.into());
        self
    }

    /// Adds an arbitrary query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    /// Renders the parameters as query pairs.
    pub fn into_query(self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(size) = self.page_size {
            query.push(("page_size".to_string(), size.to_string()));
        }
        if let Some(since) = self.since {
            query.push(("since".to_string(), since));
        }
        query.extend(self.extra);
        query
    }
}

/// Async iterator for paginating through all results.
pub struct PageIterator<T, F>
where
    F: Fn(Option<String>) -> futures::future::BoxFuture<'static, ChronoResult<Page<T>>>,
{
    /// Function fetching a page; `None` means the first page.
    fetch_fn: F,
    /// URL for the next page.
    next_url: Option<String>,
    /// Whether all pages have been consumed.
    exhausted: bool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T, F> PageIterator<T, F>
where
    F: Fn(Option<String>) -> futures::future::BoxFuture<'static, ChronoResult<Page<T>>>,
{
    /// Creates a new page iterator.
    pub fn new(fetch_fn: F) -> Self {
        Self {
            fetch_fn,
            next_url: None,
            exhausted: false,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Fetches the next page, or `None` once exhausted.
    pub async fn next_page(&mut self) -> ChronoResult<Option<Page<T>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = (self.fetch_fn)(self.next_url.take()).await?;

        if page.has_next() {
            self.next_url = page.next.clone();
        } else {
            self.exhausted = true;
        }

        Ok(Some(page))
    }

    /// Collects all items from all pages.
    pub async fn collect_all(mut self) -> ChronoResult<Vec<T>> {
        let mut all_items = Vec::new();

        while let Some(page) = self.next_page().await? {
            all_items.extend(page.into_results());
        }

        Ok(all_items)
    }

    /// Returns true if there are more pages.
    pub fn has_more(&self) -> bool {
        !self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn test_page_envelope_deserialization() {
        let page: Page<Value> = serde_json::from_value(json!({
            "previous": null,
            "next": "https://drchrono.com/api/patients?cursor=abc",
            "results": [{"id": 1}, {"id": 2}]
        }))
        .unwrap();

        assert!(page.has_next());
        assert_eq!(page.len(), 2);
        assert_eq!(
            page.next_url(),
            Some("https://drchrono.com/api/patients?cursor=abc")
        );
    }

    #[test]
    fn test_page_missing_results_defaults_empty() {
        let page: Page<Value> =
            serde_json::from_value(json!({"previous": null, "next": null})).unwrap();
        assert!(page.is_empty());
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_map() {
        let page: Page<Value> = serde_json::from_value(json!({
            "previous": null,
            "next": null,
            "results": [{"id": 7}]
        }))
        .unwrap();

        let ids = page.map(|item| item["id"].as_i64().unwrap_or_default());
        assert_eq!(ids.into_results(), vec![7]);
    }

    #[test]
    fn test_list_params_query() {
        let query = ListParams::new()
            .page_size(50)
            .since("2024-01-01T00:00:00")
            .param("doctor", "42")
            .into_query();

        assert_eq!(
            query,
            vec![
                ("page_size".to_string(), "50".to_string()),
                ("since".to_string(), "2024-01-01T00:00:00".to_string()),
                ("doctor".to_string(), "42".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_page_iterator_follows_next_links() {
        let fetch = |url: Option<String>| -> futures::future::BoxFuture<
            'static,
            ChronoResult<Page<i64>>,
        > {
            Box::pin(async move {
                match url.as_deref() {
                    None => Ok(Page {
                        previous: None,
                        next: Some("https://example.com/page2".to_string()),
                        results: vec![1, 2],
                    }),
                    Some("https://example.com/page2") => Ok(Page {
                        previous: Some("https://example.com/page1".to_string()),
                        next: None,
                        results: vec![3],
                    }),
                    Some(other) => panic!("unexpected url {other}"),
                }
            })
        };

        let items = PageIterator::new(fetch).collect_all().await.unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_page_iterator_exhaustion() {
        let fetch = |_url: Option<String>| -> futures::future::BoxFuture<
            'static,
            ChronoResult<Page<i64>>,
        > {
            Box::pin(async move {
                Ok(Page {
                    previous: None,
                    next: None,
                    results: vec![9],
                })
            })
        };

        let mut iter = PageIterator::new(fetch);
        assert!(iter.has_more());
        assert!(iter.next_page().await.unwrap().is_some());
        assert!(!iter.has_more());
        assert!(iter.next_page().await.unwrap().is_none());
    }
}
