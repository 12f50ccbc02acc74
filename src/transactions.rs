//! The paginated, filterable transaction listing and the exports started from it.

use crate::api::{Api, Session, SortDirection, TransactionPage, TransactionQuery, TypeFilter};
use crate::export::{self, CancelHandle, ExportFormat, Exported, PageCursor};
use crate::Result;
use anyhow::{anyhow, bail};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// One page of transactions under the current filters, sort order and search key. Every setter
/// re-queries the backend.
pub struct TransactionList {
    api: Arc<dyn Api>,
    session: Session,
    query: TransactionQuery,
    page: TransactionPage,
    export_batch_size: u32,
    exporting: Arc<AtomicBool>,
}

impl TransactionList {
    pub fn new(
        api: Arc<dyn Api>,
        session: Session,
        page_size: u32,
        export_batch_size: u32,
    ) -> Self {
        Self {
            api,
            session,
            query: TransactionQuery::new(page_size.max(1)),
            page: TransactionPage::default(),
            export_batch_size,
            exporting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replaces the filters, sort order and position without querying.
    pub fn with_query(mut self, query: TransactionQuery) -> Self {
        self.query = TransactionQuery {
            page_number: query.page_number.max(1),
            page_size: query.page_size.max(1),
            ..query
        };
        self
    }

    pub fn query(&self) -> &TransactionQuery {
        &self.query
    }

    /// The page most recently fetched.
    pub fn page(&self) -> &TransactionPage {
        &self.page
    }

    pub fn page_number(&self) -> u32 {
        self.query.page_number
    }

    pub fn total_pages(&self) -> u32 {
        self.page.total_no_of_pages
    }

    pub fn has_next(&self) -> bool {
        self.query.page_number < self.page.total_no_of_pages
    }

    pub fn has_prev(&self) -> bool {
        self.query.page_number > 1
    }

    /// `Showing 11-20 of 46`
    pub fn page_info(&self) -> String {
        let total = self.page.total_no_of_records;
        if total == 0 {
            return "Showing 0-0 of 0".to_string();
        }
        let size = u64::from(self.query.page_size);
        let from = (u64::from(self.query.page_number) - 1) * size + 1;
        let to = (from + size - 1).min(total);
        format!("Showing {from}-{to} of {total}")
    }

    /// Fetches the current page.
    pub async fn refresh(&mut self) -> Result<()> {
        debug!(
            "Listing page {} ({} per page)",
            self.query.page_number, self.query.page_size
        );
        let response = self
            .api
            .transactions(self.session.email(), &self.query)
            .await?;
        if !response.is_success() {
            bail!(
                "Unable to list transactions: {}",
                response.message.as_deref().unwrap_or("the server refused the request")
            );
        }
        self.page = response.response.unwrap_or_default();
        Ok(())
    }

    /// Moves to `page_number`, which must be between 1 and the last known page.
    pub async fn go_to_page(&mut self, page_number: u32) -> Result<()> {
        let last = self.page.total_no_of_pages.max(1);
        if page_number == 0 || page_number > last {
            bail!("Page {page_number} does not exist, there are {last} pages");
        }
        self.query.page_number = page_number;
        self.refresh().await
    }

    /// Moves forward one page. Returns false without querying when already on the last page.
    pub async fn next_page(&mut self) -> Result<bool> {
        if !self.has_next() {
            return Ok(false);
        }
        self.query.page_number += 1;
        self.refresh().await?;
        Ok(true)
    }

    /// Moves back one page. Returns false without querying when already on the first page.
    pub async fn prev_page(&mut self) -> Result<bool> {
        if !self.has_prev() {
            return Ok(false);
        }
        self.query.page_number -= 1;
        self.refresh().await?;
        Ok(true)
    }

    pub async fn set_page_size(&mut self, page_size: u32) -> Result<()> {
        self.query.page_size = page_size.max(1);
        self.query.page_number = 1;
        self.refresh().await
    }

    pub async fn set_search(&mut self, search_key: impl Into<String>) -> Result<()> {
        self.query.search_key = search_key.into();
        self.query.page_number = 1;
        self.refresh().await
    }

    pub async fn set_type_filter(&mut self, type_filter: TypeFilter) -> Result<()> {
        self.query.type_filter = type_filter;
        self.query.page_number = 1;
        self.refresh().await
    }

    pub async fn set_sort(
        &mut self,
        sort_field: impl Into<String>,
        sort_direction: SortDirection,
    ) -> Result<()> {
        self.query.sort_field = sort_field.into();
        self.query.sort_direction = sort_direction;
        self.query.page_number = 1;
        self.refresh().await
    }

    /// Prepares an export of every transaction under the current filters and sort order.
    ///
    /// The returned job owns everything it needs, so the listing can keep paging while it runs.
    /// Only one job may exist at a time; starting another fails until the first is dropped.
    pub fn start_export(&self, format: ExportFormat) -> Result<ExportJob> {
        let guard = ExportGuard::acquire(&self.exporting)?;
        let cursor = PageCursor::new(
            self.api.clone(),
            self.session.email(),
            &self.query,
            self.export_batch_size,
        );
        Ok(ExportJob {
            _guard: guard,
            cursor,
            format,
        })
    }

    /// True while an `ExportJob` from this listing exists.
    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::SeqCst)
    }
}

/// Marks an export as running until dropped.
struct ExportGuard(Arc<AtomicBool>);

impl ExportGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| anyhow!("An export is already running"))?;
        Ok(Self(flag.clone()))
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A pending export: gathers every page, renders the file and writes it.
pub struct ExportJob {
    _guard: ExportGuard,
    cursor: PageCursor,
    format: ExportFormat,
}

impl ExportJob {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cursor.cancel_handle()
    }

    /// Runs the export, writing into `dir`. Nothing is written if any page fails to load.
    pub async fn run(mut self, dir: &Path) -> Result<Exported> {
        let groups = self.cursor.collect_all().await?;
        debug!(
            "Gathered {} transactions in {} date groups",
            groups.record_count(),
            groups.len()
        );
        export::write(self.format, &groups, dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestApi;
    use tempfile::TempDir;

    fn list(api: TestApi, page_size: u32) -> TransactionList {
        TransactionList::new(
            Arc::new(api),
            Session::new(1, "me@example.com", "token"),
            page_size,
            4,
        )
    }

    #[tokio::test]
    async fn test_paging() {
        let mut l = list(TestApi::default(), 5);
        l.refresh().await.unwrap();
        assert_eq!(l.total_pages(), 4);
        assert_eq!(l.page_info(), "Showing 1-5 of 16");
        assert!(!l.has_prev());
        assert!(!l.prev_page().await.unwrap());

        assert!(l.next_page().await.unwrap());
        assert_eq!(l.page_info(), "Showing 6-10 of 16");
        l.go_to_page(4).await.unwrap();
        assert_eq!(l.page_info(), "Showing 16-16 of 16");
        assert!(!l.next_page().await.unwrap());
        assert_eq!(l.page_number(), 4);
        assert!(l.go_to_page(5).await.is_err());
        assert!(l.go_to_page(0).await.is_err());
    }

    #[tokio::test]
    async fn test_filters_reset_to_first_page() {
        let mut l = list(TestApi::default(), 5);
        l.refresh().await.unwrap();
        l.go_to_page(3).await.unwrap();

        l.set_search("keells").await.unwrap();
        assert_eq!(l.page_number(), 1);
        assert_eq!(l.page_info(), "Showing 1-2 of 2");

        l.set_search("").await.unwrap();
        l.go_to_page(2).await.unwrap();
        l.set_type_filter(TypeFilter::Income).await.unwrap();
        assert_eq!(l.page_number(), 1);
        assert_eq!(l.page().data.record_count(), 3);

        l.go_to_page(1).await.unwrap();
        l.set_sort("amount", SortDirection::Asc).await.unwrap();
        let amounts: Vec<String> = l
            .page()
            .data
            .records()
            .map(|(_, t)| t.amount.to_string())
            .collect();
        assert_eq!(amounts, vec!["45000.00", "250000.00", "250000.00"]);
    }

    #[tokio::test]
    async fn test_page_size_change() {
        let mut l = list(TestApi::default(), 5);
        l.refresh().await.unwrap();
        l.go_to_page(2).await.unwrap();
        l.set_page_size(20).await.unwrap();
        assert_eq!(l.page_number(), 1);
        assert_eq!(l.total_pages(), 1);
        assert_eq!(l.page_info(), "Showing 1-16 of 16");
    }

    #[tokio::test]
    async fn test_no_matches() {
        let mut l = list(TestApi::default(), 5);
        l.set_search("zzz").await.unwrap();
        assert_eq!(l.page_info(), "Showing 0-0 of 0");
        assert!(!l.has_next());
    }

    #[tokio::test]
    async fn test_failed_status_is_an_error() {
        let mut l = list(TestApi::default().with_failed_status_page(1), 5);
        assert!(l.refresh().await.is_err());
    }

    #[tokio::test]
    async fn test_export_is_exclusive() {
        let mut l = list(TestApi::default(), 5);
        l.refresh().await.unwrap();
        let job = l.start_export(ExportFormat::Excel).unwrap();
        assert!(l.is_exporting());
        let second = l.start_export(ExportFormat::Pdf);
        assert!(second
            .err()
            .unwrap()
            .to_string()
            .contains("already running"));

        // Paging still works while the export is pending.
        assert!(l.next_page().await.unwrap());

        drop(job);
        assert!(!l.is_exporting());
        assert!(l.start_export(ExportFormat::Pdf).is_ok());
    }

    #[tokio::test]
    async fn test_export_uses_filters_and_all_pages() {
        let dir = TempDir::new().unwrap();
        let mut l = list(TestApi::default(), 5);
        l.set_type_filter(TypeFilter::Expense).await.unwrap();
        let exported = l
            .start_export(ExportFormat::Excel)
            .unwrap()
            .run(dir.path())
            .await
            .unwrap();
        let Exported::Written(path) = exported else {
            panic!("expected a file, got {exported:?}");
        };
        assert!(path.is_file());
        assert!(!l.is_exporting());

        use calamine::{open_workbook, Reader, Xlsx};
        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("Transactions").unwrap();
        // Header, 13 expenses, blank, Summary and three totals.
        assert_eq!(range.height(), 1 + 13 + 1 + 4);
    }

    #[tokio::test]
    async fn test_failed_export_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let l = list(TestApi::default().with_failing_page(3), 5);
        let result = l.start_export(ExportFormat::Pdf).unwrap().run(dir.path()).await;
        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(!l.is_exporting());
    }

    #[tokio::test]
    async fn test_export_nothing() {
        let dir = TempDir::new().unwrap();
        let mut l = list(TestApi::default(), 5);
        l.set_search("zzz").await.unwrap();
        let exported = l
            .start_export(ExportFormat::Pdf)
            .unwrap()
            .run(dir.path())
            .await
            .unwrap();
        assert_eq!(exported, Exported::NothingToExport);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
