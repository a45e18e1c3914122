//! Conversion of provider display units to integer smallest units.
//!
//! Providers report amounts either as integers already in the smallest unit
//! or as decimal values in the coin's display unit ("0.00120000", `1.5e-3`).
//! [`Denominator`] scales the latter exactly with integer arithmetic; no
//! floating-point value ever reaches a canonical record.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Power-of-ten exponent between a network's display unit and its smallest
/// unit (8 for bitcoin: one coin is 10^8 satoshi).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Denominator(pub u32);

impl Default for Denominator {
    fn default() -> Self {
        Self(8)
    }
}

impl Denominator {
    /// Convert a non-negative display-unit amount to smallest units.
    pub fn to_units(self, value: &serde_json::Value) -> Result<u64, CoreError> {
        let signed = self.to_signed_units(value)?;
        u64::try_from(signed)
            .map_err(|_| CoreError::InvalidResponse(format!("negative amount `{value}`")))
    }

    /// Convert a display-unit amount that may legitimately be negative, such
    /// as a pending balance delta.
    pub fn to_signed_units(self, value: &serde_json::Value) -> Result<i64, CoreError> {
        let text = match value {
            serde_json::Value::String(s) => s.trim().to_owned(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => {
                return Err(CoreError::InvalidResponse(format!(
                    "expected numeric amount, got: {value}"
                )))
            }
        };
        scale_decimal(&text, self.0)
            .ok_or_else(|| CoreError::InvalidResponse(format!("invalid amount `{text}`")))
    }
}

/// Parse `text` as a decimal with optional exponent and multiply it by
/// 10^`exponent`, rounding half away from zero on dropped digits.
fn scale_decimal(text: &str, exponent: u32) -> Option<i64> {
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (mantissa, exp) = match rest.find(['e', 'E']) {
        Some(pos) => (&rest[..pos], rest[pos + 1..].parse::<i32>().ok()?),
        None => (rest, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{int_part}{frac_part}");
    let digits = digits.trim_start_matches('0');
    let magnitude: u128 = if digits.is_empty() { 0 } else { digits.parse().ok()? };

    let scale = i64::from(exponent) + i64::from(exp) - frac_part.len() as i64;
    let scaled = if scale >= 0 {
        let factor = 10u128.checked_pow(u32::try_from(scale).ok()?)?;
        magnitude.checked_mul(factor)?
    } else {
        match 10u128.checked_pow(u32::try_from(-scale).ok()?) {
            Some(divisor) => {
                let quotient = magnitude / divisor;
                let remainder = magnitude % divisor;
                if remainder >= divisor - remainder {
                    quotient + 1
                } else {
                    quotient
                }
            }
            // More dropped digits than u128 can hold: rounds to zero.
            None => 0,
        }
    };

    let scaled = i64::try_from(scaled).ok()?;
    Some(if negative { -scaled } else { scaled })
}
