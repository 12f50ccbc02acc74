//! Request and response shapes shared by every `Api` implementation.

use crate::model::DateGroups;
use serde::{Deserialize, Serialize};

/// The status discriminator carried by every backend response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiStatus {
    Success,
    Failed,
    #[serde(other)]
    Unknown,
}

/// The envelope every backend endpoint answers with:
/// `{ "status": "SUCCESS", "response": ..., "message": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ApiStatus,
    pub response: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(response: T) -> Self {
        Self {
            status: ApiStatus::Success,
            response: Some(response),
            message: None,
        }
    }

    /// A successful response whose payload is `null`.
    pub fn empty() -> Self {
        Self {
            status: ApiStatus::Success,
            response: None,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Failed,
            response: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ApiStatus::Success
    }

    /// The payload, if the status is `SUCCESS` and the payload is not `null`.
    pub fn success(self) -> Option<T> {
        if self.is_success() {
            self.response
        } else {
            None
        }
    }
}

/// One page of the transaction listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    #[serde(default)]
    pub data: DateGroups,
    #[serde(default)]
    pub total_no_of_pages: u32,
    #[serde(default)]
    pub total_no_of_records: u64,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

serde_plain::derive_display_from_serialize!(SortDirection);
serde_plain::derive_fromstr_from_deserialize!(SortDirection);

/// Restricts a listing to one transaction type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Expense,
    Income,
}

serde_plain::derive_display_from_serialize!(TypeFilter);
serde_plain::derive_fromstr_from_deserialize!(TypeFilter);

impl TypeFilter {
    /// The value of the `transactionType` query parameter. The backend treats an empty value as
    /// "all types".
    pub fn as_query(&self) -> &'static str {
        match self {
            TypeFilter::All => "",
            TypeFilter::Expense => "expense",
            TypeFilter::Income => "income",
        }
    }
}

pub const DEFAULT_SORT_FIELD: &str = "date";

/// The parameters of a transaction listing request. Page numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub page_number: u32,
    pub page_size: u32,
    pub search_key: String,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub type_filter: TypeFilter,
}

impl TransactionQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_number: 1,
            page_size,
            search_key: String::new(),
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_direction: SortDirection::default(),
            type_filter: TypeFilter::default(),
        }
    }

    /// The same filters and sort order, positioned at `page_number` with `page_size` records per
    /// page.
    pub fn at_page(&self, page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
            ..self.clone()
        }
    }

    /// Query string parameters for the listing endpoint. The search key is trimmed and otherwise
    /// passed through; URL encoding is left to the HTTP client.
    pub fn params(&self, email: &str) -> Vec<(&'static str, String)> {
        let sort_field = if self.sort_field.trim().is_empty() {
            DEFAULT_SORT_FIELD
        } else {
            self.sort_field.trim()
        };
        vec![
            ("email", email.to_string()),
            ("pageNumber", self.page_number.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("searchKey", self.search_key.trim().to_string()),
            ("sortField", sort_field.to_string()),
            ("sortDirec", self.sort_direction.to_string()),
            ("transactionType", self.type_filter.as_query().to_string()),
        ]
    }
}
