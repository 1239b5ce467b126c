// ===============================
// src/validator.rs
// ===============================
//
// Payload webhook tidak dipercaya: parse -> cek field -> normalisasi symbol
// -> cek angka -> cek field wajib per aksi. Exchange tidak pernah dipanggil
// untuk payload yang gagal di sini.
//
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{Action, Amount, NormalizedCommand};

/// Suffix TradingView untuk kontrak perpetual Bybit (mis. `BTCUSDT.P`).
pub const PERP_SUFFIX: &str = ".P";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No JSON data received")]
    MissingBody,
    #[error("Missing '{0}' field")]
    MissingField(&'static str),
    #[error("{0} must be a valid number")]
    InvalidNumber(&'static str),
    #[error("{0} must be a positive number")]
    NonPositive(&'static str),
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
    #[error("Missing '{field}' for {action}")]
    MissingForAction { action: Action, field: &'static str },
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

/// Parse raw request bytes, then validate.
pub fn validate_bytes(body: &[u8]) -> Result<NormalizedCommand, ValidationError> {
    let payload: Value = serde_json::from_slice(body).map_err(|_| ValidationError::MissingBody)?;
    validate(&payload)
}

pub fn validate(payload: &Value) -> Result<NormalizedCommand, ValidationError> {
    let obj = match payload {
        Value::Object(m) if !m.is_empty() => m,
        _ => return Err(ValidationError::MissingBody),
    };

    let raw_action = non_empty_str(obj, "action").ok_or(ValidationError::MissingField("action"))?;
    let action = Action::parse(raw_action)
        .ok_or_else(|| ValidationError::UnknownAction(raw_action.to_string()))?;

    let raw_symbol = non_empty_str(obj, "symbol").ok_or(ValidationError::MissingField("symbol"))?;
    let symbol = normalize_symbol(raw_symbol);
    if symbol.is_empty() {
        return Err(ValidationError::MissingField("symbol"));
    }
    let symbol = symbol.to_string();

    let qty = positive_amount(obj, "qty")?;
    let price = positive_amount(obj, "price")?;

    let require = |v: Option<Amount>, field: &'static str| {
        v.ok_or(ValidationError::MissingForAction { action, field })
    };

    let cmd = match action {
        Action::EntryLong => NormalizedCommand::EntryLong {
            symbol,
            qty: require(qty, "qty")?,
            price: require(price, "price")?,
        },
        Action::EntryShort => NormalizedCommand::EntryShort {
            symbol,
            qty: require(qty, "qty")?,
            price: require(price, "price")?,
        },
        Action::ExitLong => NormalizedCommand::ExitLong { symbol, qty: require(qty, "qty")? },
        Action::ExitShort => NormalizedCommand::ExitShort { symbol, qty: require(qty, "qty")? },
        Action::Cancel => NormalizedCommand::Cancel { symbol },
    };
    Ok(cmd)
}

/// Strip a single trailing `.P` (case-sensitive).
pub fn normalize_symbol(symbol: &str) -> &str {
    symbol.strip_suffix(PERP_SUFFIX).unwrap_or(symbol)
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// `null`/absent -> Ok(None). Numbers and numeric strings are accepted.
fn positive_amount(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Amount>, ValidationError> {
    let parsed = match obj.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => parse_decimal(&n.to_string(), field)?,
        Some(Value::String(s)) => parse_decimal(s.trim(), field)?,
        Some(_) => return Err(ValidationError::InvalidNumber(field)),
    };
    Amount::new(parsed)
        .map(Some)
        .ok_or(ValidationError::NonPositive(field))
}

/// Decimal parse that keeps "too small/large for a Decimal" apart from
/// "not a number": a positive value that cannot be represented exactly
/// is `OutOfRange`, never `NonPositive`.
fn parse_decimal(s: &str, field: &'static str) -> Result<Decimal, ValidationError> {
    if s.is_empty() {
        return Err(ValidationError::InvalidNumber(field));
    }
    // NaN/inf literals have no digits; "1e400" does
    let float = s
        .parse::<f64>()
        .ok()
        .filter(|f| !f.is_nan())
        .filter(|f| f.is_finite() || s.bytes().any(|b| b.is_ascii_digit()));
    let decimal = Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
        .or_else(|| float.filter(|f| f.is_finite()).and_then(|f| Decimal::try_from(f).ok()));

    match (decimal, float) {
        (Some(d), Some(f)) if d.is_zero() && f > 0.0 => Err(ValidationError::OutOfRange(field)),
        (Some(d), _) => Ok(d),
        (None, Some(f)) if f > 0.0 => Err(ValidationError::OutOfRange(field)),
        (None, Some(_)) => Err(ValidationError::NonPositive(field)),
        (None, None) => Err(ValidationError::InvalidNumber(field)),
    }
}
