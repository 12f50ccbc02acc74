//! Amount type for handling monetary values coming from the API.
//!
//! The backend sends amounts as JSON numbers, sometimes as numeric strings, and uses `null` where
//! nothing has been recorded. `Amount` accepts all of these and only rounds when it is displayed.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// The currency prefix used in rendered documents.
pub const CURRENCY: &str = "Rs.";

/// The number of decimal places used whenever an amount crosses the display boundary.
const DISPLAY_DP: u32 = 2;

/// Represents a monetary amount.
///
/// Equality and ordering are numeric, so `Amount::from_str("5.0")` equals
/// `Amount::from_str("5.00")`.
///
/// # Examples
///
/// ```
/// # use pockit::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("Rs. 1,250.505").unwrap();
/// assert_eq!(amount.to_string(), "1250.51");
/// assert_eq!(amount.rupees(), "Rs. 1250.51");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    pub const ZERO: Amount = Amount::new(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Returns the underlying, unrounded Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.value.is_sign_positive()
    }

    /// The amount rounded to two decimal places, midpoints away from zero.
    pub fn rounded(&self) -> Amount {
        let mut value = self
            .value
            .round_dp_with_strategy(DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(DISPLAY_DP);
        Amount::new(value)
    }

    /// `Rs. 1234.50`
    pub fn rupees(&self) -> String {
        format!("{CURRENCY} {self}")
    }

    /// `1,234.50`, for terminal output.
    pub fn with_commas(&self) -> String {
        format_num::format_num!(",.2", self.rounded().value.to_f64().unwrap_or_default())
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let without_currency = trimmed
            .strip_prefix(CURRENCY)
            .map(str::trim_start)
            .unwrap_or(trimmed);
        let without_commas = without_currency.replace(',', "");

        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Ok(Amount::new(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded().value)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.value.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a numeric string or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount::new(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::new(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        // Display for f64 is the shortest representation that round-trips, so 87.43 stays 87.43.
        Amount::from_str(&v.to_string()).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::ZERO)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount::new(self.value + rhs.value)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount::new(self.value - rhs.value)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("50.00").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
    }

    #[test]
    fn test_parse_with_currency_and_commas() {
        let amount = Amount::from_str("Rs. 1,234,567.89").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_empty_string() {
        let amount = Amount::from_str("   ").unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("twelve").is_err());
    }

    #[test]
    fn test_display_rounds_to_two_places() {
        assert_eq!(Amount::from_str("10").unwrap().to_string(), "10.00");
        assert_eq!(Amount::from_str("10.005").unwrap().to_string(), "10.01");
        assert_eq!(Amount::from_str("-10.005").unwrap().to_string(), "-10.01");
        assert_eq!(Amount::from_str("3.14159").unwrap().to_string(), "3.14");
    }

    #[test]
    fn test_rupees() {
        let amount = Amount::from_str("87.4").unwrap();
        assert_eq!(amount.rupees(), "Rs. 87.40");
    }

    #[test]
    fn test_with_commas() {
        let amount = Amount::from_str("60000").unwrap();
        assert_eq!(amount.with_commas(), "60,000.00");
    }

    #[test]
    fn test_deserialize_number() {
        let amount: Amount = serde_json::from_str("87.43").unwrap();
        assert_eq!(amount.value(), dec("87.43"));
    }

    #[test]
    fn test_deserialize_integer() {
        let amount: Amount = serde_json::from_str("1500").unwrap();
        assert_eq!(amount.value(), dec("1500"));
    }

    #[test]
    fn test_deserialize_string() {
        let amount: Amount = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(amount.value(), dec("12.5"));
    }

    #[test]
    fn test_deserialize_null() {
        let amount: Amount = serde_json::from_str("null").unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_deserialize_optional_field() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(default)]
            amount: Amount,
        }
        let w: Wrapper = serde_json::from_str(r#"{"amount": null}"#).unwrap();
        assert!(w.amount.is_zero());
        let w: Wrapper = serde_json::from_str(r#"{}"#).unwrap();
        assert!(w.amount.is_zero());
    }

    #[test]
    fn test_numeric_equality() {
        let a = Amount::from_str("5.0").unwrap();
        let b = Amount::from_str("5.00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_is_positive() {
        assert!(Amount::from_str("0.01").unwrap().is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::from_str("-1").unwrap().is_positive());
    }

    #[test]
    fn test_sum() {
        let total: Amount = ["1.10", "2.20", "3.30"]
            .iter()
            .map(|s| Amount::from_str(s).unwrap())
            .sum();
        assert_eq!(total.value(), dec("6.60"));
    }
}
