//! A layer over any `Api` that reacts to authentication failures.
//!
//! When any call comes back with `ApiError::Unauthorized`, the guard deletes the stored session
//! and invokes the `on_invalidated` callback. This happens at most once per guard no matter how
//! many calls fail, so a burst of concurrent requests produces a single "please log in" prompt.

use crate::api::wire::{ApiResponse, TransactionPage, TransactionQuery};
use crate::api::{Api, ApiResult, SessionStore};
use crate::model::{Amount, Category, Month, TransactionType};
use serde::de::IgnoredAny;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Called once when the backend has rejected the session.
pub type OnInvalidated = Box<dyn Fn() + Send + Sync>;

pub struct SessionGuard {
    inner: Arc<dyn Api>,
    store: SessionStore,
    on_invalidated: OnInvalidated,
    invalidated: AtomicBool,
}

impl SessionGuard {
    pub fn new(inner: Arc<dyn Api>, store: SessionStore, on_invalidated: OnInvalidated) -> Self {
        Self {
            inner,
            store,
            on_invalidated,
            invalidated: AtomicBool::new(false),
        }
    }

    /// True once a 401 has been seen.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }

    async fn check<T>(&self, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.invalidate().await;
            }
        }
        result
    }

    async fn invalidate(&self) {
        if self.invalidated.swap(true, Ordering::SeqCst) {
            return;
        }
        warn!("The backend rejected the session token, clearing the stored session");
        if let Err(e) = self.store.clear().await {
            warn!("Unable to clear the stored session: {e:#}");
        }
        (self.on_invalidated)();
    }
}

#[async_trait::async_trait]
impl Api for SessionGuard {
    async fn total_income_or_expense(
        &self,
        user_id: i64,
        kind: TransactionType,
        month: Month,
    ) -> ApiResult<ApiResponse<Amount>> {
        let result = self
            .inner
            .total_income_or_expense(user_id, kind, month)
            .await;
        self.check(result).await
    }

    async fn total_no_of_transactions(
        &self,
        user_id: i64,
        month: Month,
    ) -> ApiResult<ApiResponse<u64>> {
        let result = self.inner.total_no_of_transactions(user_id, month).await;
        self.check(result).await
    }

    async fn total_by_category(
        &self,
        email: &str,
        category_id: i64,
        month: Month,
    ) -> ApiResult<ApiResponse<Amount>> {
        let result = self
            .inner
            .total_by_category(email, category_id, month)
            .await;
        self.check(result).await
    }

    async fn categories(&self) -> ApiResult<ApiResponse<Vec<Category>>> {
        let result = self.inner.categories().await;
        self.check(result).await
    }

    async fn transactions(
        &self,
        email: &str,
        query: &TransactionQuery,
    ) -> ApiResult<ApiResponse<TransactionPage>> {
        let result = self.inner.transactions(email, query).await;
        self.check(result).await
    }

    async fn budget(&self, month: Month) -> ApiResult<ApiResponse<Amount>> {
        let result = self.inner.budget(month).await;
        self.check(result).await
    }

    async fn create_budget(&self, amount: Amount) -> ApiResult<ApiResponse<IgnoredAny>> {
        let result = self.inner.create_budget(amount).await;
        self.check(result).await
    }
}
