//! Amount type for collection values reported by the analyzer API.
//!
//! The API serializes decimal fields either as JSON strings (`"1500.00"`) or as plain numbers, and
//! people sometimes paste formatted values like `Ksh 1,500.00` into workbooks. `Amount` accepts all
//! of these and always displays with the currency prefix, thousands separators and two decimals.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// The currency prefix used when displaying amounts.
pub const CURRENCY: &str = "Ksh";

/// Represents a currency amount such as a collection, banked or unbanked total.
///
/// # Examples
///
/// ```
/// # use attendance_report::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("Ksh 1,500.5").unwrap();
/// assert_eq!(amount.to_string(), "Ksh 1,500.50");
/// assert_eq!(amount.to_f64(), 1500.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The value as a float, for spreadsheet cells and averages.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

/// Formats `value` with the currency prefix, thousands separators and two decimals.
pub fn format_currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!(
        "{sign}{CURRENCY} {}",
        format_num::format_num!(",.2", value.abs())
    )
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
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
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

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        let without_currency = unsigned
            .strip_prefix(CURRENCY)
            .or_else(|| unsigned.strip_prefix("KSH"))
            .or_else(|| unsigned.strip_prefix("KES"))
            .unwrap_or(unsigned)
            .trim_start();

        let digits = without_currency.replace(',', "");
        let value = Decimal::from_str(&digits).map_err(AmountError)?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&format_currency(self.to_f64()))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Same shape as the API: a plain decimal string.
        serializer.serialize_str(&format!("{:.2}", self.0))
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
        f.write_str("a decimal amount as a number or string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Decimal::from_f64(v)
            .map(Amount)
            .ok_or_else(|| E::custom(format!("{v} is not representable as an amount")))
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
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
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
        let amount = Amount::from_str("1500.00").unwrap();
        assert_eq!(amount.value(), dec("1500.00"));
    }

    #[test]
    fn test_parse_with_currency_and_commas() {
        let amount = Amount::from_str("Ksh 1,234,567.89").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_negative_with_currency() {
        let amount = Amount::from_str("-KES 50").unwrap();
        assert_eq!(amount.value(), dec("-50"));
    }

    #[test]
    fn test_parse_empty_string() {
        let amount = Amount::from_str("   ").unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("lots").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::new(dec("50")).to_string(), "Ksh 50.00");
        assert_eq!(Amount::new(dec("60000.5")).to_string(), "Ksh 60,000.50");
        assert_eq!(Amount::new(dec("-12.5")).to_string(), "-Ksh 12.50");
        assert_eq!(Amount::ZERO.to_string(), "Ksh 0.00");
    }

    #[test]
    fn test_deserialize_string_and_number() {
        let a: Amount = serde_json::from_str("\"250.75\"").unwrap();
        assert_eq!(a.value(), dec("250.75"));
        let b: Amount = serde_json::from_str("300").unwrap();
        assert_eq!(b.value(), dec("300"));
        let c: Amount = serde_json::from_str("12.5").unwrap();
        assert_eq!(c.value(), dec("12.5"));
        let d: Amount = serde_json::from_str("null").unwrap();
        assert!(d.is_zero());
    }

    #[test]
    fn test_serialize() {
        let amount = Amount::new(dec("50.5"));
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"50.50\"");
    }

    #[test]
    fn test_sum_and_ordering() {
        let amounts = [Amount::new(dec("1.10")), Amount::new(dec("2.20"))];
        let total: Amount = amounts.iter().sum();
        assert_eq!(total.value(), dec("3.30"));
        assert!(amounts[0] < amounts[1]);
    }
}
