use crate::model::{Amount, TransactionType};
use serde::{Deserialize, Serialize};

/// The transaction type a category belongs to, as nested in the category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryType {
    pub transaction_type_id: TransactionType,
    #[serde(default)]
    pub transaction_type_name: Option<String>,
}

/// A spending or income category known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: i64,
    pub category_name: String,
    pub transaction_type: CategoryType,
}

impl Category {
    pub fn new(category_id: i64, category_name: impl Into<String>, kind: TransactionType) -> Self {
        Self {
            category_id,
            category_name: category_name.into(),
            transaction_type: CategoryType {
                transaction_type_id: kind,
                transaction_type_name: Some(kind.label().to_lowercase()),
            },
        }
    }

    pub fn kind(&self) -> TransactionType {
        self.transaction_type.transaction_type_id
    }

    pub fn is_expense(&self) -> bool {
        self.kind() == TransactionType::Expense
    }
}

/// Total spend recorded against one expense category for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub amount: Amount,
}
