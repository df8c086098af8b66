//! Decimal price type.
//!
//! Prices are plain amounts in the listing store's currency unit (dollars,
//! rupees, ...). Search results never carry a reliable currency code, so none
//! is tracked; formatting always uses `$` like the grocery sites being compared.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::item::Quantity;

/// Errors that can occur when building a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Input had no digits.
    #[error("price cannot be empty")]
    Empty,
    /// Input was not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// Prices can't be below zero.
    #[error("price cannot be negative")]
    Negative,
    /// Above what the `NUMERIC(12,2)` price columns hold.
    #[error("price exceeds {}", Price::MAX)]
    TooLarge,
}

/// A non-negative price.
///
/// Serializes as a JSON number (`7.19`) because list and search payloads are
/// consumed by a browser frontend that does arithmetic on them. Deserializes
/// from either a number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest accepted price, `9,999,999,999.99`.
    pub const MAX: Self = Self(Decimal::from_parts(3_567_587_327, 232, 0, false, 2));

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` for amounts below zero and
    /// `PriceError::TooLarge` for amounts above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Parse display text such as `$1,299.99`, `$ 4.50` or `7`.
    ///
    /// Commas are treated as thousands separators and dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing numeric remains after stripping the
    /// currency symbol, or the remainder is not a non-negative decimal.
    pub fn parse_text(text: &str) -> Result<Self, PriceError> {
        let trimmed = text.trim();
        let unsigned = trimmed.strip_prefix('$').unwrap_or(trimmed).trim_start();
        let digits: String = unsigned.chars().filter(|c| *c != ',').collect();
        if digits.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount =
            Decimal::from_str(&digits).map_err(|_| PriceError::Invalid(trimmed.to_owned()))?;
        Self::new(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity.
    ///
    /// Totals are display values and may exceed [`Price::MAX`]; they
    /// saturate at the `Decimal` range instead of overflowing.
    #[must_use]
    pub fn line_total(&self, qty: Quantity) -> Self {
        Self(self.0.saturating_mul(Decimal::from(qty.get())))
    }

    /// Sum of `price * qty` over a set of lines.
    pub fn total<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (Self, Quantity)>,
    {
        lines.into_iter().fold(Self::ZERO, |acc, (price, qty)| {
            Self(acc.0.saturating_add(price.line_total(qty).0))
        })
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_text(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
