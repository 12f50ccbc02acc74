use crate::api::{Api, TransactionQuery};
use crate::model::DateGroups;
use crate::Result;
use anyhow::{anyhow, bail};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// No export gathers more pages than this, whatever the server reports.
pub const MAX_PAGES: u32 = 10_000;

/// Walks every page of a listing under fixed filters, one request at a time.
///
/// The cursor stops once the page it just fetched is the last one the server reports
/// (`page >= totalNoOfPages`, or `totalNoOfPages == 0`), when a request fails, or when it is
/// cancelled.
pub struct PageCursor {
    api: Arc<dyn Api>,
    email: String,
    query: TransactionQuery,
    batch_size: u32,
    next: u32,
    done: bool,
    cancelled: Arc<AtomicBool>,
}

/// Cancels a `PageCursor` from elsewhere, e.g. another task.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl PageCursor {
    /// Starts at page 1 of `query`'s filters and sort order, fetching `batch_size` records per
    /// request.
    pub fn new(
        api: Arc<dyn Api>,
        email: impl Into<String>,
        query: &TransactionQuery,
        batch_size: u32,
    ) -> Self {
        Self {
            api,
            email: email.into(),
            query: query.clone(),
            batch_size: batch_size.max(1),
            next: 1,
            done: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancelled.clone())
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True once the last page has been fetched or a request has failed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetches the next page. Returns `None` once there is nothing more to fetch.
    pub async fn next_page(&mut self) -> Result<Option<DateGroups>> {
        if self.done || self.is_cancelled() {
            return Ok(None);
        }
        let page_number = self.next;
        if page_number > MAX_PAGES {
            self.done = true;
            bail!("Stopped after {MAX_PAGES} pages, the server keeps reporting more");
        }

        let query = self.query.at_page(page_number, self.batch_size);
        let response = match self.api.transactions(&self.email, &query).await {
            Ok(r) => r,
            Err(e) => {
                self.done = true;
                return Err(anyhow!(e).context(format!("Unable to fetch page {page_number}")));
            }
        };
        if !response.is_success() {
            self.done = true;
            bail!(
                "The server could not list page {page_number}: {}",
                response.message.as_deref().unwrap_or("no reason given")
            );
        }

        let page = response.response.unwrap_or_default();
        debug!(
            "Fetched page {page_number} of {} ({} records)",
            page.total_no_of_pages,
            page.data.record_count()
        );
        if page.total_no_of_pages == 0 || page_number >= page.total_no_of_pages {
            self.done = true;
        }
        self.next += 1;
        Ok(Some(page.data))
    }

    /// Fetches every remaining page and merges them, joining groups that share a date label.
    /// A cancelled collection is an error so that nothing partial gets exported.
    pub async fn collect_all(&mut self) -> Result<DateGroups> {
        let mut all = DateGroups::new();
        while let Some(groups) = self.next_page().await? {
            all.merge(groups);
        }
        if self.is_cancelled() {
            bail!("The export was cancelled");
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TestApi, TypeFilter};

    fn cursor(api: Arc<TestApi>, query: &TransactionQuery, batch_size: u32) -> PageCursor {
        PageCursor::new(api, "me@example.com", query, batch_size)
    }

    #[tokio::test]
    async fn test_collects_every_page() {
        let api = Arc::new(TestApi::default());
        let query = TransactionQuery::new(10);

        // Sum the per-page counts independently.
        let mut per_page = 0;
        let mut c = cursor(api.clone(), &query, 3);
        while let Some(groups) = c.next_page().await.unwrap() {
            per_page += groups.record_count();
        }
        assert_eq!(api.listing_calls(), 6);

        let all = cursor(api.clone(), &query, 3).collect_all().await.unwrap();
        assert_eq!(all.record_count(), per_page);
        assert_eq!(all.record_count(), 16);

        let mut labels: Vec<&str> = all.iter().map(|g| g.label()).collect();
        let before = labels.len();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), before, "a date label appears twice");
    }

    #[tokio::test]
    async fn test_groups_split_across_pages_are_merged() {
        // 2025-10-18 and 2025-10-15 each hold two records; with one record per page every
        // group is split across pages.
        let api = Arc::new(TestApi::default());
        let all = cursor(api, &TransactionQuery::new(10), 1)
            .collect_all()
            .await
            .unwrap();
        assert_eq!(all.get("2025-10-18").unwrap().transactions().len(), 2);
        assert_eq!(all.get("2025-10-15").unwrap().transactions().len(), 2);
        assert_eq!(all.len(), 14);
    }

    #[tokio::test]
    async fn test_keeps_filters() {
        let api = Arc::new(TestApi::default());
        let mut query = TransactionQuery::new(10);
        query.type_filter = TypeFilter::Income;
        query.page_number = 7;
        let all = cursor(api, &query, 2).collect_all().await.unwrap();
        assert_eq!(all.record_count(), 3);
        assert!(all.records().all(|(_, t)| t.is_income()));
    }

    #[tokio::test]
    async fn test_zero_pages_stops_after_one_request() {
        let api = Arc::new(TestApi::without_transactions().unwrap());
        let all = cursor(api.clone(), &TransactionQuery::new(10), 100)
            .collect_all()
            .await
            .unwrap();
        assert!(all.is_empty());
        assert_eq!(api.listing_calls(), 1);
    }

    #[tokio::test]
    async fn test_failing_page_aborts() {
        let api = Arc::new(TestApi::default().with_failing_page(2));
        let mut c = cursor(api.clone(), &TransactionQuery::new(10), 5);
        assert!(c.collect_all().await.is_err());
        assert!(c.is_done());
        assert_eq!(api.listing_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_status_aborts() {
        let api = Arc::new(TestApi::default().with_failed_status_page(3));
        let err = cursor(api, &TransactionQuery::new(10), 5)
            .collect_all()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("page 3"));
    }

    #[tokio::test]
    async fn test_cancelled_cursor_fetches_nothing() {
        let api = Arc::new(TestApi::default());
        let mut c = cursor(api.clone(), &TransactionQuery::new(10), 5);
        assert!(c.next_page().await.unwrap().is_some());
        c.cancel_handle().cancel();
        assert!(c.next_page().await.unwrap().is_none());
        assert!(c.collect_all().await.is_err());
        assert_eq!(api.listing_calls(), 1);
    }
}
