use crate::error::HaushaltError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Number of decimal places every amount is normalised to.
pub const AMOUNT_SCALE: u32 = 2;

/// Parse a German-formatted amount cell into a signed decimal.
///
/// Handles formats like:
/// - "1.234,56" -> 1234.56
/// - "1234,5" -> 1234.50
/// - "-42" / "- 42" -> -42.00
/// - "(42)" or "42-" -> -42.00
/// - "+7" -> 7.00
/// - "", "-", "–", "./." -> None (not reported)
///
/// Fraction digits beyond the second are cut off. Anything else that is
/// not blank is a `ValueFormat` error.
pub fn parse_amount(s: &str) -> Result<Option<Decimal>, HaushaltError> {
    let s = s.trim();

    if is_placeholder(s) {
        return Ok(None);
    }

    let (negative, digits) = split_sign(s).ok_or_else(|| value_error(s))?;
    let mut amount = parse_german_number(digits).ok_or_else(|| value_error(s))?;
    if negative {
        amount = -amount;
    }
    if amount.is_zero() {
        amount.set_sign_positive(true);
    }
    Ok(Some(amount))
}

fn is_placeholder(s: &str) -> bool {
    matches!(s, "" | "-" | "–" | "—" | "./." | "n.a." | "x" | "X")
}

fn value_error(s: &str) -> HaushaltError {
    HaushaltError::ValueFormat {
        text: s.to_string(),
    }
}

/// Separate the sign convention from the digits: leading `-`/`+`,
/// trailing `-` or surrounding parentheses.
fn split_sign(s: &str) -> Option<(bool, &str)> {
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        return Some((true, inner.trim()));
    }
    if let Some(rest) = s.strip_prefix(['-', '–', '−']) {
        return Some((true, rest.trim_start()));
    }
    if let Some(rest) = s.strip_prefix('+') {
        return Some((false, rest.trim_start()));
    }
    if let Some(rest) = s.strip_suffix(['-', '–', '−']) {
        return Some((true, rest.trim_end()));
    }
    Some((false, s))
}

/// Parse the unsigned part: `.` groups thousands, `,` is the decimal marker.
fn parse_german_number(s: &str) -> Option<Decimal> {
    let (int_part, frac_part) = match s.split_once(',') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };

    if !valid_grouping(int_part) {
        return None;
    }
    if let Some(f) = frac_part {
        if f.is_empty() || !f.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }

    let mut normalized: String = int_part.chars().filter(|c| *c != '.').collect();
    if let Some(f) = frac_part {
        normalized.push('.');
        normalized.push_str(f);
    }

    let value = Decimal::from_str(&normalized).ok()?;
    let mut value = value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::ToZero);
    value.rescale(AMOUNT_SCALE);
    Some(value)
}

/// Either plain digits, or 1-3 leading digits followed by `.ddd` groups.
fn valid_grouping(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let groups: Vec<&str> = s.split('.').collect();
    let all_digits = |g: &str| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit());
    if groups.len() == 1 {
        return all_digits(groups[0]);
    }
    all_digits(groups[0])
        && groups[0].len() <= 3
        && groups[1..].iter().all(|g| g.len() == 3 && all_digits(g))
}
