//! Monthly dashboard: income and expense totals, cash in hand, per-category spend and budget.
//!
//! Failures are handled at three levels. A single category total that fails is logged and left
//! out of the summary. A failed primary total (income, expense or count) sets
//! `DashboardState::is_error`. A rejected session (HTTP 401) aborts with an error after the
//! `SessionGuard` has cleared the session.

use crate::api::{Api, ApiError, ApiResponse, ApiResult, Session};
use crate::model::{Amount, Category, CategorySummary, Month, TransactionType};
use crate::Result;
use anyhow::bail;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Everything the dashboard displays for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardState {
    pub month: Month,
    pub total_income: Amount,
    pub total_expense: Amount,
    pub no_of_transactions: u64,
    pub category_summary: Vec<CategorySummary>,
    pub budget: Amount,
    pub is_loading: bool,
    pub is_error: bool,
}

impl DashboardState {
    fn new(month: Month) -> Self {
        Self {
            month,
            total_income: Amount::ZERO,
            total_expense: Amount::ZERO,
            no_of_transactions: 0,
            category_summary: Vec::new(),
            budget: Amount::ZERO,
            is_loading: false,
            is_error: false,
        }
    }

    /// Income minus expense when that is positive, otherwise zero.
    pub fn cash_in_hand(&self) -> Amount {
        cash_in_hand(self.total_income, self.total_expense)
    }
}

/// `max(income - expense, 0)`, rounded to two decimal places.
pub fn cash_in_hand(income: Amount, expense: Amount) -> Amount {
    if income > expense {
        (income - expense).rounded()
    } else {
        Amount::ZERO
    }
}

/// Holds the dashboard state for one user and month and knows how to refresh it.
pub struct Dashboard {
    api: Arc<dyn Api>,
    session: Session,
    concurrency: usize,
    categories: Option<Vec<Category>>,
    state: DashboardState,
}

impl Dashboard {
    /// `concurrency` bounds how many per-category requests are in flight at once.
    pub fn new(api: Arc<dyn Api>, session: Session, month: Month, concurrency: usize) -> Self {
        Self {
            api,
            session,
            concurrency: concurrency.max(1),
            categories: None,
            state: DashboardState::new(month),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn into_state(self) -> DashboardState {
        self.state
    }

    /// Switches to `month` and reloads everything.
    pub async fn set_month(&mut self, month: Month) -> Result<()> {
        self.state = DashboardState::new(month);
        self.load().await
    }

    /// Refreshes the totals, the category summary and the budget.
    pub async fn load(&mut self) -> Result<()> {
        self.state.is_loading = true;
        self.state.is_error = false;
        let result = self.load_inner().await;
        self.state.is_loading = false;
        result
    }

    async fn load_inner(&mut self) -> Result<()> {
        self.refresh_totals().await?;
        if self.ensure_categories().await? {
            self.refresh_category_summary().await?;
        }
        self.refresh_budget().await
    }

    /// Fetches total income, total expense and the transaction count concurrently. Totals that
    /// succeed are applied even if another one fails.
    pub async fn refresh_totals(&mut self) -> Result<()> {
        let user_id = self.session.id();
        let month = self.state.month;
        let (income, expense, count) = tokio::join!(
            self.api
                .total_income_or_expense(user_id, TransactionType::Income, month),
            self.api
                .total_income_or_expense(user_id, TransactionType::Expense, month),
            self.api.total_no_of_transactions(user_id, month),
        );

        if let Some(r) = self.tolerate("total income", income)? {
            if r.is_success() {
                self.state.total_income = r.response.unwrap_or_default().rounded();
            }
        }
        if let Some(r) = self.tolerate("total expense", expense)? {
            if r.is_success() {
                self.state.total_expense = r.response.unwrap_or_default().rounded();
            }
        }
        if let Some(r) = self.tolerate("transaction count", count)? {
            if r.is_success() {
                self.state.no_of_transactions = r.response.unwrap_or_default();
            }
        }
        Ok(())
    }

    /// Loads the category list once. Returns false if it is unavailable, in which case the
    /// category summary is skipped.
    async fn ensure_categories(&mut self) -> Result<bool> {
        if self.categories.is_some() {
            return Ok(true);
        }
        match self.api.categories().await {
            Ok(r) => match r.success() {
                Some(categories) => {
                    debug!("Loaded {} categories", categories.len());
                    self.categories = Some(categories);
                    Ok(true)
                }
                None => {
                    warn!("The category list was not available");
                    Ok(false)
                }
            },
            Err(e) if e.is_unauthorized() => Err(e.into()),
            Err(e) => {
                warn!("Error fetching categories: {e:#}");
                Ok(false)
            }
        }
    }

    /// Rebuilds the per-category spend summary from the expense categories.
    pub async fn refresh_category_summary(&mut self) -> Result<()> {
        let categories: Vec<Category> = self
            .categories
            .iter()
            .flatten()
            .filter(|c| c.is_expense())
            .cloned()
            .collect();
        let fanout = summarize_categories(
            self.api.clone(),
            self.session.email(),
            self.state.month,
            categories,
            self.concurrency,
        )
        .await;
        if fanout.failures.iter().any(|f| f.unauthorized) {
            bail!(ApiError::Unauthorized);
        }
        self.state.category_summary = fanout.summaries;
        Ok(())
    }

    /// Fetches the month's budget. Any failure other than a rejected session resets the budget
    /// to zero.
    pub async fn refresh_budget(&mut self) -> Result<()> {
        match self.api.budget(self.state.month).await {
            Ok(r) => {
                if r.is_success() {
                    self.state.budget = r.response.unwrap_or_default();
                }
                Ok(())
            }
            Err(e) if e.is_unauthorized() => Err(e.into()),
            Err(e) => {
                debug!("Error fetching budget: {e:#}");
                self.state.budget = Amount::ZERO;
                Ok(())
            }
        }
    }

    /// Writes a new budget and then re-fetches it. A failed write sets the error flag.
    pub async fn save_budget(&mut self, amount: Amount) -> Result<()> {
        if amount.value().is_sign_negative() && !amount.is_zero() {
            bail!("A budget cannot be negative, got {amount}");
        }
        match self.api.create_budget(amount).await {
            Ok(r) if r.is_success() => {}
            Ok(r) => {
                warn!(
                    "Error saving budget: {}",
                    r.message.as_deref().unwrap_or("the server refused the request")
                );
                self.state.is_error = true;
            }
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => {
                warn!("Error saving budget: {e:#}");
                self.state.is_error = true;
            }
        }
        self.refresh_budget().await
    }

    /// Passes through successes, turns a 401 into an error and records anything else on the
    /// shared error flag.
    fn tolerate<T>(&mut self, what: &str, result: ApiResult<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_unauthorized() => Err(e.into()),
            Err(e) => {
                warn!("Error fetching {what}: {e:#}");
                self.state.is_error = true;
                Ok(None)
            }
        }
    }
}

/// One category whose total could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFailure {
    pub category_id: i64,
    pub name: String,
    pub error: String,
    pub unauthorized: bool,
}

/// The outcome of fetching every category total: the summaries that could be built and a log of
/// the categories that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryFanout {
    pub summaries: Vec<CategorySummary>,
    pub failures: Vec<CategoryFailure>,
}

/// Fetches the month's total for each of `categories`, at most `limit` at a time.
///
/// Categories with no spend (a `null` or zero total) or a `FAILED` response are left out.
/// Summaries are returned in the order of `categories`, whatever order the requests finish in.
pub async fn summarize_categories(
    api: Arc<dyn Api>,
    email: &str,
    month: Month,
    categories: Vec<Category>,
    limit: usize,
) -> CategoryFanout {
    let semaphore = Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS)));
    let mut tasks = JoinSet::new();
    for (index, category) in categories.into_iter().enumerate() {
        let api = api.clone();
        let email = email.to_string();
        let semaphore = semaphore.clone();
        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    api.total_by_category(&email, category.category_id, month)
                        .await
                }
                Err(_) => Err(ApiError::Simulated("the request limiter was closed".into())),
            };
            (index, category, result)
        });
    }

    let mut summaries: Vec<(usize, CategorySummary)> = Vec::new();
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, category, result): (usize, Category, ApiResult<ApiResponse<Amount>>) =
            match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("A category total task did not complete: {e}");
                    continue;
                }
            };
        match result {
            Ok(r) => match r.success() {
                Some(amount) if !amount.is_zero() => summaries.push((
                    index,
                    CategorySummary {
                        name: category.category_name,
                        amount: amount.rounded(),
                    },
                )),
                _ => {}
            },
            Err(e) => {
                warn!("Error fetching category {}: {e:#}", category.category_name);
                failures.push(CategoryFailure {
                    category_id: category.category_id,
                    name: category.category_name,
                    unauthorized: e.is_unauthorized(),
                    error: e.to_string(),
                });
            }
        }
    }

    summaries.sort_by_key(|(index, _)| *index);
    CategoryFanout {
        summaries: summaries.into_iter().map(|(_, s)| s).collect(),
        failures,
    }
}
