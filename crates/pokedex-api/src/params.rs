//! Request parameter parsing.
//!
//! Integers in paths and query strings are read the way JavaScript's
//! `parseInt` reads them, which the public API has always relied on: leading
//! whitespace and an optional sign are accepted, then as many digits as are
//! present; anything after the digits is ignored. Path ids pass an explicit
//! radix of 10; query parameters pass none, so a `0x` prefix selects hex.

use serde::Serialize;

use pokedex_store::Document;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    /// `parseInt(value, 10)`: decimal digits only.
    Decimal,
    /// `parseInt(value)`: hex after a `0x`/`0X` prefix, decimal otherwise.
    Detect,
}

/// Parse the leading integer of `input`. `None` when there are no digits
/// (the `NaN` case).
///
/// Values beyond `i64` saturate.
pub fn parse_int(input: &str, radix: Radix) -> Option<i64> {
    let s = input.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (base, digits) = match radix {
        Radix::Detect => match rest.get(..2) {
            Some("0x" | "0X") => (16, &rest[2..]),
            _ => (10, rest),
        },
        Radix::Decimal => (10, rest),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for digit in digits.chars().map_while(|c| c.to_digit(base)) {
        seen = true;
        value = value
            .saturating_mul(i64::from(base))
            .saturating_add(i64::from(digit));
    }
    if !seen {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// `parseInt(value) || default`: missing, non-numeric and zero all fall
/// back to `default`. Negative values are kept.
fn parse_or_default(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|v| parse_int(v, Radix::Detect))
        .filter(|v| *v != 0)
        .unwrap_or(default)
}

/// Resolved pagination window for the list route.
///
/// Negative `page`/`limit` pass through unchanged: a negative skip is then
/// rejected by the store and a negative limit is read by its magnitude.
/// Likely a latent defect; preserved as observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Resolve from raw query pairs. The first occurrence of a key wins.
    pub fn from_query(pairs: &[(String, String)]) -> Self {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        Self {
            page: parse_or_default(first("page"), DEFAULT_PAGE),
            limit: parse_or_default(first("limit"), DEFAULT_LIMIT),
        }
    }

    /// `(page - 1) * limit`, or `None` on overflow.
    pub fn skip(&self) -> Option<i64> {
        self.page.checked_sub(1)?.checked_mul(self.limit)
    }

    /// `ceil(total / limit)`.
    pub fn pages(&self, total: u64) -> i64 {
        (total as f64 / self.limit as f64).ceil() as i64
    }
}

#[derive(Debug, Serialize)]
pub struct PokemonPage {
    pub pokemons: Vec<Document>,
    pub page: i64,
    pub total: u64,
    pub pages: i64,
}
