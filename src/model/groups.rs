//! Transactions grouped under a date label, in the order the server delivered them.

use crate::model::Transaction;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One date bucket. The label is either an ISO day (`2025-10-18`) or a relative label such as
/// `Today` or `Yesterday`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateGroup {
    label: String,
    transactions: Vec<Transaction>,
}

impl DateGroup {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

/// A mapping from date label to the transactions recorded under it.
///
/// On the wire this is a JSON object keyed by date label. Group order follows the order of the
/// keys in the document, and a label is never present twice: pushing or merging into an existing
/// label appends to that group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateGroups {
    groups: Vec<DateGroup>,
}

impl DateGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `transactions` to the group labelled `label`, creating the group at the end if it
    /// does not exist yet.
    pub fn extend_group(
        &mut self,
        label: impl Into<String>,
        transactions: impl IntoIterator<Item = Transaction>,
    ) {
        let label = label.into();
        match self.groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.transactions.extend(transactions),
            None => self.groups.push(DateGroup {
                label,
                transactions: transactions.into_iter().collect(),
            }),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, transaction: Transaction) {
        self.extend_group(label, std::iter::once(transaction))
    }

    /// Merges another page of groups into this one. Same-label groups are concatenated in page
    /// order; new labels are appended.
    pub fn merge(&mut self, other: DateGroups) {
        for group in other.groups {
            self.extend_group(group.label, group.transactions);
        }
    }

    pub fn get(&self, label: &str) -> Option<&DateGroup> {
        self.groups.iter().find(|g| g.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DateGroup> {
        self.groups.iter()
    }

    /// The number of date groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when there are no transactions at all, even if empty groups are present.
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// The number of transactions across all groups.
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.transactions.len()).sum()
    }

    /// Iterates `(label, transaction)` pairs in group order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &Transaction)> {
        self.groups
            .iter()
            .flat_map(|g| g.transactions.iter().map(move |t| (g.label.as_str(), t)))
    }
}

impl Serialize for DateGroups {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.label, &group.transactions)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DateGroups {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DateGroupsVisitor)
    }
}

struct DateGroupsVisitor;

impl<'de> Visitor<'de> for DateGroupsVisitor {
    type Value = DateGroups;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping date labels to lists of transactions")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut groups = DateGroups::new();
        while let Some((label, transactions)) =
            access.next_entry::<String, Vec<Transaction>>()?
        {
            groups.extend_group(label, transactions);
        }
        Ok(groups)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(DateGroups::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, TransactionType};
    use std::str::FromStr;

    fn tx(desc: &str, amount: &str) -> Transaction {
        Transaction::new(
            "Food",
            desc,
            TransactionType::Expense,
            Amount::from_str(amount).unwrap(),
        )
    }

    #[test]
    fn test_deserialize_preserves_key_order() {
        let json = r#"{
            "Today": [{"transactionType": 1, "amount": 1}],
            "2025-10-01": [{"transactionType": 2, "amount": 2}],
            "2024-01-31": [{"transactionType": 1, "amount": 3}]
        }"#;
        let groups: DateGroups = serde_json::from_str(json).unwrap();
        let labels: Vec<&str> = groups.iter().map(|g| g.label()).collect();
        assert_eq!(labels, vec!["Today", "2025-10-01", "2024-01-31"]);
    }

    #[test]
    fn test_deserialize_null_is_empty() {
        let groups: DateGroups = serde_json::from_str("null").unwrap();
        assert!(groups.is_empty());
        assert_eq!(groups.len(), 0);
    }

    #[test]
    fn test_merge_appends_same_label() {
        let mut first = DateGroups::new();
        first.push("2025-10-02", tx("a", "1"));
        first.push("2025-10-01", tx("b", "2"));

        let mut second = DateGroups::new();
        second.push("2025-10-01", tx("c", "3"));
        second.push("2025-09-30", tx("d", "4"));

        first.merge(second);

        assert_eq!(first.len(), 3);
        assert_eq!(first.record_count(), 4);
        let oct1: Vec<_> = first
            .get("2025-10-01")
            .unwrap()
            .transactions()
            .iter()
            .map(|t| t.description.clone().unwrap())
            .collect();
        assert_eq!(oct1, vec!["b", "c"]);
    }

    #[test]
    fn test_records_flatten_in_order() {
        let mut groups = DateGroups::new();
        groups.push("Today", tx("a", "1"));
        groups.push("Yesterday", tx("b", "1"));
        groups.push("Today", tx("c", "1"));
        let flat: Vec<(&str, &str)> = groups
            .records()
            .map(|(label, t)| (label, t.description.as_deref().unwrap()))
            .collect();
        assert_eq!(flat, vec![("Today", "a"), ("Today", "c"), ("Yesterday", "b")]);
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut groups = DateGroups::new();
        groups.push("2025-10-01", tx("a", "1.5"));
        let json = serde_json::to_string(&groups).unwrap();
        let back: DateGroups = serde_json::from_str(&json).unwrap();
        assert_eq!(groups, back);
    }
}
