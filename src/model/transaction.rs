use crate::model::Amount;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The closed set of transaction types the backend knows about. On the wire this is the numeric
/// `transactionTypeId`: `1` for an expense and `2` for income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TransactionType {
    Expense,
    Income,
}

impl TransactionType {
    pub const fn id(self) -> u8 {
        match self {
            TransactionType::Expense => 1,
            TransactionType::Income => 2,
        }
    }

    /// The label used in exported documents.
    pub const fn label(self) -> &'static str {
        match self {
            TransactionType::Expense => "Expense",
            TransactionType::Income => "Income",
        }
    }
}

impl TryFrom<u8> for TransactionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TransactionType::Expense),
            2 => Ok(TransactionType::Income),
            other => Err(format!("unknown transaction type id {other}")),
        }
    }
}

impl From<TransactionType> for u8 {
    fn from(value: TransactionType) -> Self {
        value.id()
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single transaction as it appears in the grouped transaction listing. The date is not part
/// of the record; it is the key of the group the record was delivered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub amount: Amount,
}

impl Transaction {
    pub fn new(
        category_name: impl Into<String>,
        description: impl Into<String>,
        transaction_type: TransactionType,
        amount: Amount,
    ) -> Self {
        Self {
            transaction_id: None,
            category_name: Some(category_name.into()),
            description: Some(description.into()),
            transaction_type,
            amount,
        }
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transaction_type_wire_codes() {
        let t: TransactionType = serde_json::from_str("1").unwrap();
        assert_eq!(t, TransactionType::Expense);
        let t: TransactionType = serde_json::from_str("2").unwrap();
        assert_eq!(t, TransactionType::Income);
        assert_eq!(serde_json::to_string(&TransactionType::Income).unwrap(), "2");
    }

    #[test]
    fn test_transaction_type_is_closed() {
        assert!(serde_json::from_str::<TransactionType>("0").is_err());
        assert!(serde_json::from_str::<TransactionType>("3").is_err());
    }

    #[test]
    fn test_deserialize_transaction() {
        let json = r#"{
            "transactionId": 17,
            "categoryName": "Groceries",
            "description": "Weekly shop",
            "transactionType": 1,
            "amount": 87.43
        }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.transaction_id, Some(17));
        assert_eq!(t.category_name.as_deref(), Some("Groceries"));
        assert!(t.is_expense());
        assert_eq!(t.amount, Amount::from_str("87.43").unwrap());
    }

    #[test]
    fn test_deserialize_transaction_missing_optionals() {
        let json = r#"{"transactionType": 2, "description": null}"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert!(t.is_income());
        assert!(t.category_name.is_none());
        assert!(t.description.is_none());
        assert!(t.amount.is_zero());
    }
}
