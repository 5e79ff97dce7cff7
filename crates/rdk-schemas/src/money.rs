//! Integer-cents currency representation.
//!
//! # Design invariant
//!
//! Rent, payment and expense amounts are carried as `i64` cents inside the
//! client. The backend stores `NUMERIC(10,2)` and renders it either as a
//! decimal string (`"1500.00"`) or as a JSON number, depending on the
//! endpoint. Both shapes are accepted on the way in.
//!
//! | Direction            | Function              | Notes                          |
//! |----------------------|-----------------------|--------------------------------|
//! | client → REST body   | [`Money::to_f64`]     | Serialization only             |
//! | REST body → client   | [`Money::from_f64`]   | Number payloads                |
//! | REST body / CLI arg  | [`Money::parse`]      | Decimal strings, max 2 places  |

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Scale factor: 1 currency unit = 100 cents.
pub const CENTS_PER_UNIT: i64 = 100;

// ---------------------------------------------------------------------------
// MoneyError
// ---------------------------------------------------------------------------

/// Errors returned when an amount is not representable as whole cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Input was `NaN` or infinite.
    NotFinite,
    /// Input would overflow `i64` after scaling by [`CENTS_PER_UNIT`].
    OutOfRange,
    /// Decimal string had more than two fractional digits.
    Precision(String),
    /// Input was not a decimal number at all.
    Malformed(String),
}

impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyError::NotFinite => write!(f, "amount is not finite (NaN or Inf)"),
            MoneyError::OutOfRange => write!(f, "amount out of range"),
            MoneyError::Precision(raw) => {
                write!(f, "amount '{raw}' has more than two decimal places")
            }
            MoneyError::Malformed(raw) => write!(f, "amount '{raw}' is not a decimal number"),
        }
    }
}

impl std::error::Error for MoneyError {}

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// A currency amount in integer cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn from_units(units: i64) -> Result<Self, MoneyError> {
        units
            .checked_mul(CENTS_PER_UNIT)
            .map(Self)
            .ok_or(MoneyError::OutOfRange)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Wire-boundary conversion for JSON request bodies.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }

    /// Convert a JSON number into cents, rounding to the nearest cent.
    pub fn from_f64(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::NotFinite);
        }
        let scaled = (value * CENTS_PER_UNIT as f64).round();
        if scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
            return Err(MoneyError::OutOfRange);
        }
        Ok(Self(scaled as i64))
    }

    /// Parse a decimal string such as `"1500"`, `"1500.5"` or `"-12.30"`.
    pub fn parse(raw: &str) -> Result<Self, MoneyError> {
        let t = raw.trim();
        let (negative, body) = match t.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, t),
        };

        let (whole, frac) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };

        let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
            return Err(MoneyError::Malformed(raw.to_string()));
        }
        if frac.len() > 2 {
            return Err(MoneyError::Precision(raw.to_string()));
        }

        let whole_cents = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<i64>()
                .map_err(|_| MoneyError::OutOfRange)?
                .checked_mul(CENTS_PER_UNIT)
                .ok_or(MoneyError::OutOfRange)?
        };
        let frac_cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| MoneyError::Malformed(raw.to_string()))? * 10,
            _ => frac.parse::<i64>().map_err(|_| MoneyError::Malformed(raw.to_string()))?,
        };

        let cents = whole_cents
            .checked_add(frac_cents)
            .ok_or(MoneyError::OutOfRange)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = CENTS_PER_UNIT as u64;
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount as a number or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Money::from_units(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(MoneyError::OutOfRange))?;
        Money::from_units(v).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse(v).map_err(E::custom)
    }
}
