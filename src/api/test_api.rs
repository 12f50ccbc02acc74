//! Implements the `Api` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a backend. See `Mode::Test`.

use crate::api::wire::{ApiResponse, SortDirection, TransactionPage, TransactionQuery, TypeFilter};
use crate::api::{Api, ApiError, ApiResult};
use crate::model::{Amount, Category, DateGroups, Month, Transaction, TransactionType};
use crate::Result;
use anyhow::Context;
use chrono::NaiveDate;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{self, AtomicUsize};
use std::sync::Mutex;

/// A transaction together with the day it was recorded on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub date: NaiveDate,
    pub transaction: Transaction,
}

impl Record {
    pub fn new(date: NaiveDate, transaction: Transaction) -> Self {
        Self { date, transaction }
    }

    fn in_month(&self, month: Month) -> bool {
        Month::containing(self.date) == month
    }

    fn matches(&self, query: &TransactionQuery) -> bool {
        let t = &self.transaction;
        let type_ok = match query.type_filter {
            TypeFilter::All => true,
            TypeFilter::Expense => t.is_expense(),
            TypeFilter::Income => t.is_income(),
        };
        let needle = query.search_key.trim().to_lowercase();
        let search_ok = needle.is_empty()
            || [&t.description, &t.category_name]
                .iter()
                .filter_map(|s| s.as_deref())
                .any(|s| s.to_lowercase().contains(&needle));
        type_ok && search_ok
    }
}

/// Switches that make the in-memory backend misbehave.
#[derive(Debug, Clone, Default)]
struct Faults {
    unauthorized: bool,
    totals: bool,
    budget: bool,
    categories: HashSet<i64>,
    page: Option<u32>,
    failed_status_page: Option<u32>,
}

/// An implementation of the `Api` trait that does not use the network. It holds categories and
/// transactions in memory and, by default, is seeded with some existing data.
#[derive(Debug)]
pub struct TestApi {
    categories: Vec<Category>,
    records: Vec<Record>,
    budgets: Mutex<HashMap<Month, Amount>>,
    faults: Faults,
    listing_calls: AtomicUsize,
}

impl TestApi {
    pub fn new(categories: Vec<Category>, records: Vec<Record>) -> Self {
        Self {
            categories,
            records,
            budgets: Mutex::new(HashMap::new()),
            faults: Faults::default(),
            listing_calls: AtomicUsize::new(0),
        }
    }

    /// Loads the seed data embedded in this module.
    pub fn seeded() -> Result<Self> {
        let categories = load_categories(CATEGORY_DATA)?;
        let records = load_records(TRANSACTION_DATA, &categories)?;
        Ok(Self::new(categories, records))
    }

    /// The seed categories with no transactions at all.
    pub fn without_transactions() -> Result<Self> {
        Ok(Self::new(load_categories(CATEGORY_DATA)?, Vec::new()))
    }

    /// Every call fails with a 401.
    pub fn with_unauthorized(mut self) -> Self {
        self.faults.unauthorized = true;
        self
    }

    /// The income, expense and count endpoints fail.
    pub fn with_failing_totals(mut self) -> Self {
        self.faults.totals = true;
        self
    }

    /// Budget lookups and writes fail.
    pub fn with_failing_budget(mut self) -> Self {
        self.faults.budget = true;
        self
    }

    /// The per-category total for `category_id` fails.
    pub fn with_failing_category(mut self, category_id: i64) -> Self {
        self.faults.categories.insert(category_id);
        self
    }

    /// Requesting listing page `page_number` fails as if the server were unreachable.
    pub fn with_failing_page(mut self, page_number: u32) -> Self {
        self.faults.page = Some(page_number);
        self
    }

    /// Requesting listing page `page_number` answers with a `FAILED` status.
    pub fn with_failed_status_page(mut self, page_number: u32) -> Self {
        self.faults.failed_status_page = Some(page_number);
        self
    }

    pub fn with_budget(self, month: Month, amount: Amount) -> Self {
        if let Ok(mut budgets) = self.budgets.lock() {
            budgets.insert(month, amount);
        }
        self
    }

    /// How many times the listing endpoint has been called.
    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(atomic::Ordering::SeqCst)
    }

    fn guard(&self) -> ApiResult<()> {
        if self.faults.unauthorized {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }

    fn sum(&self, month: Month, filter: impl Fn(&Transaction) -> bool) -> Option<Amount> {
        let mut matching = self
            .records
            .iter()
            .filter(|r| r.in_month(month) && filter(&r.transaction))
            .map(|r| r.transaction.amount)
            .peekable();
        // The backend answers null rather than 0 when nothing matches.
        matching.peek()?;
        Some(matching.sum())
    }

    fn page(&self, query: &TransactionQuery) -> TransactionPage {
        let mut matching: Vec<&Record> = self.records.iter().filter(|r| r.matches(query)).collect();
        matching.sort_by(|a, b| {
            let ordering = compare(a, b, &query.sort_field);
            match query.sort_direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let page_size = query.page_size.max(1) as usize;
        let total = matching.len();
        let total_pages = total.div_ceil(page_size);
        let skip = (query.page_number.max(1) as usize - 1) * page_size;

        let mut data = DateGroups::new();
        for record in matching.into_iter().skip(skip).take(page_size) {
            data.push(
                record.date.format("%Y-%m-%d").to_string(),
                record.transaction.clone(),
            );
        }
        TransactionPage {
            data,
            total_no_of_pages: total_pages as u32,
            total_no_of_records: total as u64,
        }
    }
}

impl Default for TestApi {
    fn default() -> Self {
        Self::seeded().expect("the embedded seed data is valid")
    }
}

fn compare(a: &Record, b: &Record, sort_field: &str) -> Ordering {
    let (ta, tb) = (&a.transaction, &b.transaction);
    match sort_field {
        "amount" => ta.amount.cmp(&tb.amount),
        "description" => ta.description.cmp(&tb.description),
        "category" | "categoryName" => ta.category_name.cmp(&tb.category_name),
        _ => a.date.cmp(&b.date),
    }
}

#[async_trait::async_trait]
impl Api for TestApi {
    async fn total_income_or_expense(
        &self,
        _user_id: i64,
        kind: TransactionType,
        month: Month,
    ) -> ApiResult<ApiResponse<Amount>> {
        self.guard()?;
        if self.faults.totals {
            return Err(ApiError::Simulated("totals are unavailable".into()));
        }
        Ok(match self.sum(month, |t| t.transaction_type == kind) {
            Some(total) => ApiResponse::ok(total),
            None => ApiResponse::empty(),
        })
    }

    async fn total_no_of_transactions(
        &self,
        _user_id: i64,
        month: Month,
    ) -> ApiResult<ApiResponse<u64>> {
        self.guard()?;
        if self.faults.totals {
            return Err(ApiError::Simulated("totals are unavailable".into()));
        }
        let count = self.records.iter().filter(|r| r.in_month(month)).count();
        Ok(ApiResponse::ok(count as u64))
    }

    async fn total_by_category(
        &self,
        _email: &str,
        category_id: i64,
        month: Month,
    ) -> ApiResult<ApiResponse<Amount>> {
        self.guard()?;
        if self.faults.categories.contains(&category_id) {
            return Err(ApiError::Simulated(format!(
                "category {category_id} is unavailable"
            )));
        }
        let Some(category) = self
            .categories
            .iter()
            .find(|c| c.category_id == category_id)
        else {
            return Ok(ApiResponse::failed("Category not found"));
        };
        let name = category.category_name.as_str();
        Ok(
            match self.sum(month, |t| {
                t.is_expense() && t.category_name.as_deref() == Some(name)
            }) {
                Some(total) => ApiResponse::ok(total),
                None => ApiResponse::empty(),
            },
        )
    }

    async fn categories(&self) -> ApiResult<ApiResponse<Vec<Category>>> {
        self.guard()?;
        Ok(ApiResponse::ok(self.categories.clone()))
    }

    async fn transactions(
        &self,
        _email: &str,
        query: &TransactionQuery,
    ) -> ApiResult<ApiResponse<TransactionPage>> {
        self.listing_calls.fetch_add(1, atomic::Ordering::SeqCst);
        self.guard()?;
        if self.faults.page == Some(query.page_number) {
            return Err(ApiError::Simulated(format!(
                "page {} is unavailable",
                query.page_number
            )));
        }
        if self.faults.failed_status_page == Some(query.page_number) {
            return Ok(ApiResponse::failed("Failed to fetch transactions"));
        }
        Ok(ApiResponse::ok(self.page(query)))
    }

    async fn budget(&self, month: Month) -> ApiResult<ApiResponse<Amount>> {
        self.guard()?;
        if self.faults.budget {
            return Err(ApiError::Simulated("budget is unavailable".into()));
        }
        let budgets = self
            .budgets
            .lock()
            .map_err(|_| ApiError::Simulated("budget store is poisoned".into()))?;
        Ok(match budgets.get(&month) {
            Some(amount) => ApiResponse::ok(*amount),
            None => ApiResponse::empty(),
        })
    }

    /// Like the real backend, a new budget applies to the current month.
    async fn create_budget(&self, amount: Amount) -> ApiResult<ApiResponse<IgnoredAny>> {
        self.guard()?;
        if self.faults.budget {
            return Err(ApiError::Simulated("budget is unavailable".into()));
        }
        let mut budgets = self
            .budgets
            .lock()
            .map_err(|_| ApiError::Simulated("budget store is poisoned".into()))?;
        budgets.insert(Month::current(), amount);
        Ok(ApiResponse::empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CategoryRow {
    id: i64,
    name: String,
    r#type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TransactionRow {
    date: NaiveDate,
    category: String,
    description: String,
    amount: String,
}

fn load_categories(csv_data: &str) -> Result<Vec<Category>> {
    let mut rdr = csv::Reader::from_reader(Cursor::new(csv_data.as_bytes()));
    let mut categories = Vec::new();
    for result in rdr.deserialize() {
        let row: CategoryRow = result.context("Invalid seed category row")?;
        let kind = match row.r#type.as_str() {
            "Income" => TransactionType::Income,
            _ => TransactionType::Expense,
        };
        categories.push(Category::new(row.id, row.name, kind));
    }
    Ok(categories)
}

/// Loads seed transactions. The transaction type comes from the row's category.
fn load_records(csv_data: &str, categories: &[Category]) -> Result<Vec<Record>> {
    let mut rdr = csv::Reader::from_reader(Cursor::new(csv_data.as_bytes()));
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let row: TransactionRow = result.context("Invalid seed transaction row")?;
        let kind = categories
            .iter()
            .find(|c| c.category_name == row.category)
            .map(Category::kind)
            .with_context(|| format!("Seed category '{}' does not exist", row.category))?;
        let amount = row
            .amount
            .parse::<Amount>()
            .with_context(|| format!("Invalid seed amount '{}'", row.amount))?;
        let mut transaction = Transaction::new(row.category, row.description, kind, amount);
        transaction.transaction_id = Some(records.len() as i64 + 1);
        records.push(Record::new(row.date, transaction));
    }
    Ok(records)
}

/// Seed category data.
const CATEGORY_DATA: &str = r##"Id,Name,Type
1,Groceries,Expense
2,Restaurants,Expense
3,Transport,Expense
4,Utilities,Expense
5,Entertainment,Expense
6,Salary,Income
7,Freelance,Income
"##;

/// Seed transaction data.
const TRANSACTION_DATA: &str = r##"Date,Category,Description,Amount
2025-10-20,Groceries,Keells Super,8743.50
2025-10-19,Restaurants,Ministry of Crab,12500.00
2025-10-18,Transport,Uber to office,1250.75
2025-10-18,Groceries,Cargills Food City,4321.10
2025-10-17,Utilities,Electricity bill,6890.00
2025-10-15,Entertainment,Cinema tickets,3200.00
2025-10-15,Freelance,Logo design,45000.00
2025-10-12,Restaurants,Pizza night,5400.00
2025-10-10,Transport,Fuel,9800.00
2025-10-05,Utilities,Water bill,1450.25
2025-10-01,Salary,October salary,250000.00
2025-09-28,Groceries,Keells Super,7610.40
2025-09-25,Restaurants,Birthday dinner,18250.00
2025-09-20,Transport,Train pass,2400.00
2025-09-15,Utilities,Internet,4990.00
2025-09-01,Salary,September salary,250000.00
"##;
