//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(12, 2)` and travel over the wire as plain
//! JSON numbers (`19.99`), but inside the process they are always a
//! [`Decimal`] so averages and comparisons never suffer float rounding.
//!
//! [`Price::new`] only admits amounts that column can hold exactly: at most
//! two decimal places and below [`Price::LIMIT`].

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price must not be negative (got {0})")]
    Negative(Decimal),
    /// The amount has more than two decimal places.
    #[error("price must have at most 2 decimal places (got {0})")]
    TooPrecise(Decimal),
    /// The amount is at or above [`Price::LIMIT`].
    #[error("price must be below {limit} (got {0})", limit = Price::LIMIT)]
    TooLarge(Decimal),
    /// The input is not a decimal number.
    #[error("price is not a valid decimal number: {0}")]
    Invalid(String),
}

/// A non-negative monetary amount that fits `NUMERIC(12, 2)`.
///
/// ## Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use stockroom_core::Price;
///
/// assert!(Price::new(Decimal::new(1999, 2)).is_ok());
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// assert!(Price::new(Decimal::new(1005, 3)).is_err());
/// assert_eq!("19.99".parse::<Price>().unwrap().to_string(), "19.99");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Exclusive upper bound: ten integer digits.
    pub const LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

    /// Number of decimal places a stored price may carry.
    pub const SCALE: u32 = 2;

    /// Create a price, rejecting amounts the catalog cannot store exactly.
    ///
    /// Trailing zeros do not count against the scale, so `1.500` is accepted.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    /// Returns `PriceError::TooPrecise` if `amount` has more than two decimal places.
    /// Returns `PriceError::TooLarge` if `amount` is not below [`Price::LIMIT`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        let amount = Self::derived(amount)?;
        if amount.0.round_dp(Self::SCALE) != amount.0 {
            return Err(PriceError::TooPrecise(amount.0));
        }
        Ok(amount)
    }

    /// Create a price computed from stored prices, such as a category mean.
    ///
    /// The sign and magnitude rules of [`Price::new`] apply; the scale is
    /// left as computed.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    /// Returns `PriceError::TooLarge` if `amount` is not below [`Price::LIMIT`].
    pub fn derived(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::ZERO {
            return Err(PriceError::Negative(amount));
        }
        if amount >= Self::LIMIT {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(amount))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Strip trailing zeros (`15.0000` becomes `15`).
    #[must_use]
    pub fn normalize(self) -> Self {
        Self(self.0.normalize())
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

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for Price {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for Price {
    fn decode(value: ::sqlx::postgres::PgValueRef<'r>) -> Result<Self, ::sqlx::error::BoxDynError> {
        let amount = <Decimal as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <Decimal as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_rejects_negative() {
        let result = Price::new(Decimal::new(-1, 2));
        assert!(matches!(result, Err(PriceError::Negative(_))));
    }

    #[test]
    fn test_price_accepts_zero() {
        assert_eq!(Price::new(Decimal::ZERO).unwrap(), Price::ZERO);
        assert!(Price::new(Decimal::new(0, 2)).is_ok());
    }

    #[test]
    fn test_price_limit_is_ten_billion() {
        assert_eq!(Price::LIMIT, Decimal::from(10_000_000_000_i64));
    }

    #[test]
    fn test_price_accepts_largest_storable_amount() {
        let price: Price = "9999999999.99".parse().unwrap();
        assert_eq!(price.amount(), Decimal::new(999_999_999_999, 2));
    }

    #[test]
    fn test_price_rejects_amount_at_limit() {
        assert!(matches!(
            "10000000000".parse::<Price>(),
            Err(PriceError::TooLarge(_))
        ));
        assert!(matches!(
            "40000000000000000000000000000".parse::<Price>(),
            Err(PriceError::TooLarge(_))
        ));
    }

    #[test]
    fn test_price_rejects_sub_cent_amounts() {
        assert!(matches!(
            "1.005".parse::<Price>(),
            Err(PriceError::TooPrecise(_))
        ));
        assert_eq!("1.500".parse::<Price>().unwrap(), "1.5".parse().unwrap());
    }

    #[test]
    fn test_derived_price_keeps_scale_and_bounds_magnitude() {
        let mean = Decimal::new(33_333_333, 7);
        assert_eq!(Price::derived(mean).unwrap().amount(), mean);
        assert!(matches!(
            Price::derived(Price::LIMIT),
            Err(PriceError::TooLarge(_))
        ));
        assert!(matches!(
            Price::derived(Decimal::NEGATIVE_ONE),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_price_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Price>("1.005").is_err());
        assert!(serde_json::from_str::<Price>("\"12345678901\"").is_err());
    }

    #[test]
    fn test_price_serializes_as_number() {
        let price: Price = "19.99".parse().unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "19.99");
    }

    #[test]
    fn test_price_deserializes_from_number_and_string() {
        let from_number: Price = serde_json::from_str("10.5").unwrap();
        let from_string: Price = serde_json::from_str("\"10.5\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.amount(), Decimal::new(105, 1));
    }

    #[test]
    fn test_price_deserialize_rejects_negative() {
        let result: Result<Price, _> = serde_json::from_str("-3");
        assert!(result.is_err());
    }

    #[test]
    fn test_price_from_str_invalid() {
        assert!(matches!(
            "ten".parse::<Price>(),
            Err(PriceError::Invalid(_))
        ));
    }

    #[test]
    fn test_price_normalize_strips_trailing_zeros() {
        let price = Price::new(Decimal::new(150_000, 4)).unwrap().normalize();
        assert_eq!(price.to_string(), "15");
        assert_eq!(serde_json::to_string(&price).unwrap(), "15.0");
    }
}
