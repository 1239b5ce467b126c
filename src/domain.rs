// ===============================
// src/domain.rs
// ===============================
use std::fmt;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Aksi yang dikirim oleh alert webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EntryLong,
    EntryShort,
    ExitLong,
    ExitShort,
    Cancel,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "entry_long" => Some(Action::EntryLong),
            "entry_short" => Some(Action::EntryShort),
            "exit_long" => Some(Action::ExitLong),
            "exit_short" => Some(Action::ExitShort),
            "cancel" => Some(Action::Cancel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::EntryLong => "entry_long",
            Action::EntryShort => "entry_short",
            Action::ExitLong => "exit_long",
            Action::ExitShort => "exit_short",
            Action::Cancel => "cancel",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side { Buy, Sell }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderType { Limit, Market }

/// Bybit market category. Only USDT-margined perpetuals are traded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category { Linear }

/// Positive decimal amount, always rendered in canonical form
/// (no trailing zeros, no exponent) so the wire payload never carries
/// float artefacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(Decimal);

impl Amount {
    /// Returns `None` for zero or negative values.
    pub fn new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Amount(value.normalize()))
        } else {
            None
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Validated webhook command. Each variant carries exactly the fields its
/// action needs, so a command can never be half-filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedCommand {
    EntryLong { symbol: String, qty: Amount, price: Amount },
    EntryShort { symbol: String, qty: Amount, price: Amount },
    ExitLong { symbol: String, qty: Amount },
    ExitShort { symbol: String, qty: Amount },
    Cancel { symbol: String },
}

impl NormalizedCommand {
    pub fn action(&self) -> Action {
        match self {
            NormalizedCommand::EntryLong { .. } => Action::EntryLong,
            NormalizedCommand::EntryShort { .. } => Action::EntryShort,
            NormalizedCommand::ExitLong { .. } => Action::ExitLong,
            NormalizedCommand::ExitShort { .. } => Action::ExitShort,
            NormalizedCommand::Cancel { .. } => Action::Cancel,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            NormalizedCommand::EntryLong { symbol, .. }
            | NormalizedCommand::EntryShort { symbol, .. }
            | NormalizedCommand::ExitLong { symbol, .. }
            | NormalizedCommand::ExitShort { symbol, .. }
            | NormalizedCommand::Cancel { symbol } => symbol,
        }
    }
}

/// Body of `POST /v5/order/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub category: Category,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub qty: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
}

/// Body of `POST /v5/order/cancel-all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelAllRequest {
    pub category: Category,
    pub symbol: String,
}
