//! Pure validators used by the flow steps.
//!
//! Every validator takes the raw text of a chat message (or of a tapped
//! button) and either returns a normalised value or a [`ValidationError`].
//! None of them has side effects, so a rejected input can be retried freely.

use unicode_normalization::UnicodeNormalization;

use crate::{
    draft::{Category, FieldValue, PaymentMethod},
    error::ValidationError,
    money::Amount,
};

/// Token a user sends to leave an optional field empty.
pub const SKIP_TOKEN: &str = "skip";

/// Parses a positive amount out of loosely formatted user input, in minor
/// units.
///
/// Currency symbols, letters and spaces are ignored; `.` and `,` are accepted
/// both as grouping and as decimal separators:
///
/// - `"250"`, `"99.95"`, `"₹1,250.50"`, `"1.250,50"`, `"Rs. 40"`, `"12,5"`
///
/// Rejected: a minus sign in front of the digits, missing digits, more than
/// two decimal places, values below one minor unit, and values that do not
/// fit in an `i64` of minor units.
pub fn parse_amount(input: &str) -> Result<Amount, ValidationError> {
    let trimmed = input.trim();
    let invalid = || ValidationError::InvalidAmount(trimmed.to_string());

    let first_digit = trimmed.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
    if trimmed[..first_digit].contains(['-', '−']) {
        return Err(invalid());
    }

    let kept: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let normalized = normalize_separators(&kept).ok_or_else(invalid)?;

    let (whole, fraction) = normalized
        .split_once('.')
        .unwrap_or((normalized.as_str(), ""));
    if fraction.len() > Amount::SCALE as usize {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: i64 = format!("{fraction:0<2}").parse().map_err(|_| invalid())?;

    let minor = whole
        .checked_mul(10_i64.pow(Amount::SCALE))
        .and_then(|value| value.checked_add(fraction))
        .ok_or_else(invalid)?;
    Amount::from_minor(minor).ok_or_else(invalid)
}

/// Rewrites `raw` (digits, `.` and `,` only) into `digits[.digits]`, deciding
/// which separator, if any, is the decimal one.
fn normalize_separators(raw: &str) -> Option<String> {
    let raw = raw.trim_matches(|c| c == '.' || c == ',');
    if raw.is_empty() {
        return None;
    }

    let dots = raw.matches('.').count();
    let commas = raw.matches(',').count();
    let decimal = match (raw.rfind('.'), raw.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (at, count) = if dot > comma { (dot, dots) } else { (comma, commas) };
            if count > 1 {
                return None;
            }
            Some(at)
        }
        (Some(dot), None) => (dots == 1).then_some(dot),
        (None, Some(comma)) => {
            let fraction = raw.len() - comma - 1;
            (commas == 1 && (1..=2).contains(&fraction)).then_some(comma)
        }
        (None, None) => None,
    };

    let mut out = String::with_capacity(raw.len());
    for (idx, ch) in raw.char_indices() {
        if ch.is_ascii_digit() {
            out.push(ch);
        } else if Some(idx) == decimal {
            out.push('.');
        }
    }
    Some(out)
}

/// Removes a leading icon (emoji or punctuation) from button-originated text.
///
/// `"🍔 Food"` and `"🍔Food"` both become `"Food"`.
pub fn strip_icon(input: &str) -> &str {
    input
        .trim()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim()
}

/// Canonical form used to compare labels: icon stripped, NFKC, lowercase,
/// without spaces, `_` and `-`.
pub(crate) fn normalize_label(input: &str) -> String {
    strip_icon(input)
        .nfkc()
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect()
}

/// Matches `input` against a closed category set, case-insensitively.
pub fn parse_category(input: &str, allowed: &[Category]) -> Result<Category, ValidationError> {
    let wanted = normalize_label(input);
    allowed
        .iter()
        .copied()
        .find(|category| normalize_label(category.label()) == wanted)
        .ok_or_else(|| ValidationError::UnknownCategory(input.trim().to_string()))
}

/// Category chosen through a button tap: unknown values fall back to
/// [`Category::Other`].
#[must_use]
pub fn category_from_selection(input: &str, allowed: &[Category]) -> Category {
    parse_category(input, allowed).unwrap_or_default()
}

pub fn parse_payment_method(input: &str) -> Result<PaymentMethod, ValidationError> {
    let wanted = normalize_label(input);
    PaymentMethod::ALL
        .iter()
        .copied()
        .find(|method| normalize_label(method.label()) == wanted)
        .ok_or_else(|| ValidationError::UnknownPaymentMethod(input.trim().to_string()))
}

/// Free text; the skip token (with or without a leading `/`) maps to an empty
/// string.
#[must_use]
pub fn parse_description(input: &str) -> String {
    let trimmed = input.trim();
    let bare = trimmed.trim_start_matches('/');
    if normalize_label(bare) == SKIP_TOKEN {
        return String::new();
    }
    trimmed.to_string()
}

pub fn parse_counterparty(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyCounterparty);
    }
    Ok(trimmed.to_string())
}

// Step validators: a uniform signature so flows can be described as tables.

pub(crate) fn validate_amount(input: &str) -> Result<FieldValue, ValidationError> {
    parse_amount(input).map(FieldValue::Amount)
}

pub(crate) fn validate_expense_category(input: &str) -> Result<FieldValue, ValidationError> {
    parse_category(input, Category::EXPENSE).map(FieldValue::Category)
}

pub(crate) fn validate_income_category(input: &str) -> Result<FieldValue, ValidationError> {
    parse_category(input, Category::INCOME).map(FieldValue::Category)
}

pub(crate) fn validate_payment_method(input: &str) -> Result<FieldValue, ValidationError> {
    parse_payment_method(input).map(FieldValue::PaymentMethod)
}

pub(crate) fn validate_description(input: &str) -> Result<FieldValue, ValidationError> {
    Ok(FieldValue::Text(parse_description(input)))
}

pub(crate) fn validate_counterparty(input: &str) -> Result<FieldValue, ValidationError> {
    parse_counterparty(input).map(FieldValue::Text)
}
