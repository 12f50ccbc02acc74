//! The seam between the views and the backend.
//!
//! `Api` is implemented by `HttpApi` (the real backend) and `TestApi` (in memory). Whichever is
//! chosen is wrapped in a `SessionGuard` so that an authentication failure anywhere clears the
//! session exactly once.

mod error;
mod guard;
mod http;
mod session;
mod test_api;
mod wire;

pub use error::{ApiError, ApiResult};
pub use guard::{OnInvalidated, SessionGuard};
pub use session::{Session, SessionStore};
pub use test_api::{Record, TestApi};
pub use wire::{
    ApiResponse, ApiStatus, SortDirection, TransactionPage, TransactionQuery, TypeFilter,
    DEFAULT_SORT_FIELD,
};

use crate::model::{Amount, Category, Month, TransactionType};
use crate::{Config, Result};
use serde::de::IgnoredAny;
use std::sync::Arc;
use tracing::debug;

/// Backend endpoints, relative to the configured API URL.
pub(crate) mod endpoints {
    pub(crate) const TOTAL_INCOME_OR_EXPENSE: &str = "mypockit/transaction/getTotalIncomeOrExpense";
    pub(crate) const TOTAL_NO_OF_TRANSACTIONS: &str = "mypockit/transaction/getTotalNoOfTransactions";
    pub(crate) const TOTAL_BY_CATEGORY: &str = "mypockit/transaction/getTotalByCategory";
    pub(crate) const TRANSACTIONS: &str = "mypockit/transaction/getAll";
    pub(crate) const CATEGORIES: &str = "mypockit/category/getAll";
    pub(crate) const BUDGET: &str = "mypockit/budget/get";
    pub(crate) const CREATE_BUDGET: &str = "mypockit/budget/create";
}

/// The backend calls the views depend on. Transport failures are `Err`; a response that arrived
/// but carries a `FAILED` status is an `Ok` whose `ApiResponse::is_success` is false.
#[async_trait::async_trait]
pub trait Api: Send + Sync {
    /// The total of all transactions of `kind` recorded by the user in `month`. The payload is
    /// `null` when there are none.
    async fn total_income_or_expense(
        &self,
        user_id: i64,
        kind: TransactionType,
        month: Month,
    ) -> ApiResult<ApiResponse<Amount>>;

    async fn total_no_of_transactions(
        &self,
        user_id: i64,
        month: Month,
    ) -> ApiResult<ApiResponse<u64>>;

    /// The total spent against one category in `month`.
    async fn total_by_category(
        &self,
        email: &str,
        category_id: i64,
        month: Month,
    ) -> ApiResult<ApiResponse<Amount>>;

    async fn categories(&self) -> ApiResult<ApiResponse<Vec<Category>>>;

    /// One page of the user's transactions, grouped by date.
    async fn transactions(
        &self,
        email: &str,
        query: &TransactionQuery,
    ) -> ApiResult<ApiResponse<TransactionPage>>;

    async fn budget(&self, month: Month) -> ApiResult<ApiResponse<Amount>>;

    /// Sets the budget for the current month.
    async fn create_budget(&self, amount: Amount) -> ApiResult<ApiResponse<IgnoredAny>>;
}

/// Selects which `Api` implementation the program talks to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The real backend at the configured API URL.
    #[default]
    Http,
    /// The in-memory `TestApi`.
    Test,
}

/// When this environment variable is set and non-empty the program runs against `TestApi`.
pub const TEST_MODE_ENV: &str = "POCKIT_IN_TEST_MODE";

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// Creates the `Api` for `mode`, authenticated as `session` and guarded so that a 401 clears the
/// stored session and calls `on_invalidated` once.
pub fn client(
    config: &Config,
    session: &Session,
    mode: Mode,
    on_invalidated: OnInvalidated,
) -> Result<Arc<dyn Api>> {
    let inner: Arc<dyn Api> = match mode {
        Mode::Http => {
            debug!("Using the backend at {}", config.api_url());
            Arc::new(http::HttpApi::new(
                config.api_url().clone(),
                session.token(),
            )?)
        }
        Mode::Test => {
            debug!("Using the in-memory test backend");
            Arc::new(TestApi::seeded()?)
        }
    };
    Ok(Arc::new(SessionGuard::new(
        inner,
        config.session_store(),
        on_invalidated,
    )))
}
