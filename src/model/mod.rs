//! Types that represent the data the backend serves, such as `Transaction` and `Category`.
mod amount;
mod category;
mod groups;
mod month;
mod transaction;

pub use amount::{Amount, AmountError, CURRENCY};
pub use category::{Category, CategorySummary, CategoryType};
pub use groups::{DateGroup, DateGroups};
pub use month::Month;
pub use transaction::{Transaction, TransactionType};
