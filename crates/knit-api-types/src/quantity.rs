//! Resource quantities in the Kubernetes quantity notation (`500m`, `1Gi`, `2e3`).

use crate::error::TypesError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Values are held as integer multiples of 10^-9.
const NANO_EXP: i32 = 9;

/// More significant digits than this cannot be held exactly.
const MAX_DIGITS: usize = 30;

/// A resource amount such as `500m` CPU or `1Gi` memory.
///
/// Equality and ordering are numeric, so `1Gi == 1024Mi` and `1 == 1000m`.
/// The text a quantity was parsed from is kept and used when formatting.
/// Fractions finer than 10^-9 are rounded up.
#[derive(Debug, Clone)]
pub struct Quantity {
    text: String,
    nanos: i128,
}

enum Suffix {
    Binary(u32),
    Decimal(i32),
}

impl Quantity {
    /// Parse `<sign><digits>[.<digits>]<suffix>`, where the suffix is one of
    /// `Ki Mi Gi Ti Pi Ei`, `n u m k M G T P E`, an exponent `e<int>`, or empty.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(TypesError::quantity(s, "a number is required"));
        }
        if frac.contains('.') {
            return Err(TypesError::quantity(s, "more than one decimal point"));
        }

        let digits = format!("{whole}{frac}");
        let digits = digits.trim_start_matches('0');
        if digits.len() > MAX_DIGITS {
            return Err(TypesError::quantity(s, "too many significant digits"));
        }
        let mantissa: i128 = if digits.is_empty() {
            0
        } else {
            digits
                .parse()
                .map_err(|_| TypesError::quantity(s, "invalid number"))?
        };

        let frac_len = i32::try_from(frac.len())
            .map_err(|_| TypesError::quantity(s, "too many fraction digits"))?;

        let out_of_range = || TypesError::quantity(s, "exponent out of range");
        let nanos = match parse_suffix(s, suffix)? {
            Suffix::Decimal(exp) => {
                let exp = exp
                    .checked_sub(frac_len)
                    .and_then(|e| e.checked_add(NANO_EXP))
                    .ok_or_else(out_of_range)?;
                scale(s, mantissa, exp)?
            }
            Suffix::Binary(shift) => {
                let m = mantissa
                    .checked_mul(1i128 << shift)
                    .ok_or_else(|| TypesError::quantity(s, "value is too large"))?;
                let exp = NANO_EXP.checked_sub(frac_len).ok_or_else(out_of_range)?;
                scale(s, m, exp)?
            }
        };

        Ok(Self {
            text: s.to_owned(),
            nanos: if negative { -nanos } else { nanos },
        })
    }

    /// The value in units of 10^-9.
    pub fn as_nanos(&self) -> i128 {
        self.nanos
    }

    /// The text this quantity was parsed from.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True if the value is zero, whatever its suffix.
    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }
}

fn parse_suffix(input: &str, suffix: &str) -> Result<Suffix, TypesError> {
    let parsed = match suffix {
        "" => Suffix::Decimal(0),
        "n" => Suffix::Decimal(-9),
        "u" => Suffix::Decimal(-6),
        "m" => Suffix::Decimal(-3),
        "k" => Suffix::Decimal(3),
        "M" => Suffix::Decimal(6),
        "G" => Suffix::Decimal(9),
        "T" => Suffix::Decimal(12),
        "P" => Suffix::Decimal(15),
        "E" => Suffix::Decimal(18),
        "Ki" => Suffix::Binary(10),
        "Mi" => Suffix::Binary(20),
        "Gi" => Suffix::Binary(30),
        "Ti" => Suffix::Binary(40),
        "Pi" => Suffix::Binary(50),
        "Ei" => Suffix::Binary(60),
        _ => {
            let exp = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))
                .and_then(|e| e.parse::<i32>().ok())
                .ok_or_else(|| TypesError::quantity(input, format!("unknown suffix {suffix:?}")))?;
            Suffix::Decimal(exp)
        }
    };
    Ok(parsed)
}

/// `mantissa * 10^exp`, rounding a fractional result up.
fn scale(input: &str, mantissa: i128, exp: i32) -> Result<i128, TypesError> {
    if mantissa == 0 {
        return Ok(0);
    }

    if exp >= 0 {
        return 10i128
            .checked_pow(exp.unsigned_abs())
            .and_then(|p| mantissa.checked_mul(p))
            .ok_or_else(|| TypesError::quantity(input, "value is too large"));
    }

    match 10i128.checked_pow(exp.unsigned_abs()) {
        Some(divisor) => Ok((mantissa + divisor - 1) / divisor),
        // Smaller than one unit: rounds up to it.
        None => Ok(1),
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl Eq for Quantity {}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nanos.hash(state);
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nanos.cmp(&other.nanos)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Quantity {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

/// Quantities arrive as strings, or as bare numbers.
struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a quantity string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
        Quantity::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
        if !v.is_finite() {
            return Err(E::custom(format!("{v} is not a quantity")));
        }
        self.visit_str(&v.to_string())
    }
}
