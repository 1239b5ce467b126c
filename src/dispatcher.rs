// ===============================
// src/dispatcher.rs
// ===============================
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::{
    Amount, CancelAllRequest, Category, NormalizedCommand, OrderRequest, OrderType, Side,
};
use crate::exchange::{ExchangeClient, ExchangeError};
use crate::metrics::{EXCHANGE_CALLS, EXCHANGE_LATENCY_MS};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

/// Satu command -> tepat satu panggilan exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeCall {
    PlaceOrder(OrderRequest),
    CancelAll(CancelAllRequest),
}

impl ExchangeCall {
    pub fn op(&self) -> &'static str {
        match self {
            ExchangeCall::PlaceOrder(_) => "place_order",
            ExchangeCall::CancelAll(_) => "cancel_all_orders",
        }
    }
}

/// Pure table lookup from command to order shape.
pub fn plan(cmd: NormalizedCommand) -> ExchangeCall {
    let limit = |symbol: String, side: Side, qty: Amount, price: Amount| {
        ExchangeCall::PlaceOrder(OrderRequest {
            category: Category::Linear,
            symbol,
            side,
            order_type: OrderType::Limit,
            qty,
            price: Some(price),
            reduce_only: None,
        })
    };
    let reduce = |symbol: String, side: Side, qty: Amount| {
        ExchangeCall::PlaceOrder(OrderRequest {
            category: Category::Linear,
            symbol,
            side,
            order_type: OrderType::Market,
            qty,
            price: None,
            reduce_only: Some(true),
        })
    };

    match cmd {
        NormalizedCommand::EntryLong { symbol, qty, price } => limit(symbol, Side::Buy, qty, price),
        NormalizedCommand::EntryShort { symbol, qty, price } => limit(symbol, Side::Sell, qty, price),
        NormalizedCommand::ExitLong { symbol, qty } => reduce(symbol, Side::Sell, qty),
        NormalizedCommand::ExitShort { symbol, qty } => reduce(symbol, Side::Buy, qty),
        NormalizedCommand::Cancel { symbol } => {
            ExchangeCall::CancelAll(CancelAllRequest { category: Category::Linear, symbol })
        }
    }
}

pub async fn dispatch(
    cmd: NormalizedCommand,
    exchange: &dyn ExchangeClient,
) -> Result<Value, DispatchError> {
    let action = cmd.action();
    let call = plan(cmd);
    let op = call.op();
    info!(%action, ?call, "dispatching");

    let started = Instant::now();
    let result = match &call {
        ExchangeCall::PlaceOrder(req) => exchange.place_order(req).await,
        ExchangeCall::CancelAll(req) => exchange.cancel_all_orders(req).await,
    };
    EXCHANGE_LATENCY_MS.observe(started.elapsed().as_secs_f64() * 1000.0);

    match result {
        Ok(resp) => {
            EXCHANGE_CALLS.with_label_values(&[op, "ok"]).inc();
            Ok(resp)
        }
        Err(e) => {
            EXCHANGE_CALLS.with_label_values(&[op, "error"]).inc();
            error!(%action, op, error = %e, "exchange call failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::mock::{Call, MockExchange};
    use rust_decimal_macros::dec;

    fn amt(v: rust_decimal::Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    fn order(call: ExchangeCall) -> OrderRequest {
        match call {
            ExchangeCall::PlaceOrder(o) => o,
            other => panic!("expected place_order, got {other:?}"),
        }
    }

    #[test]
    fn entries_are_limit_orders() {
        let o = order(plan(NormalizedCommand::EntryLong {
            symbol: "ETHUSDT".into(),
            qty: amt(dec!(1)),
            price: amt(dec!(2000)),
        }));
        assert_eq!((o.side, o.order_type), (Side::Buy, OrderType::Limit));
        assert_eq!(o.price, Some(amt(dec!(2000))));
        assert_eq!(o.reduce_only, None);
        assert_eq!(o.category, Category::Linear);

        let o = order(plan(NormalizedCommand::EntryShort {
            symbol: "BTCUSDT".into(),
            qty: amt(dec!(0.01)),
            price: amt(dec!(50000)),
        }));
        assert_eq!((o.side, o.order_type), (Side::Sell, OrderType::Limit));
        assert_eq!(o.qty.to_string(), "0.01");
    }

    #[test]
    fn exits_are_reduce_only_market_orders() {
        let o = order(plan(NormalizedCommand::ExitLong { symbol: "SOLUSDT".into(), qty: amt(dec!(10)) }));
        assert_eq!((o.side, o.order_type), (Side::Sell, OrderType::Market));
        assert_eq!((o.price, o.reduce_only), (None, Some(true)));

        let o = order(plan(NormalizedCommand::ExitShort { symbol: "XRPUSDT".into(), qty: amt(dec!(100)) }));
        assert_eq!((o.side, o.order_type), (Side::Buy, OrderType::Market));
        assert_eq!((o.price, o.reduce_only), (None, Some(true)));
    }

    #[test]
    fn cancel_maps_to_cancel_all() {
        assert_eq!(
            plan(NormalizedCommand::Cancel { symbol: "KGENUSDT".into() }),
            ExchangeCall::CancelAll(CancelAllRequest { category: Category::Linear, symbol: "KGENUSDT".into() })
        );
    }

    #[tokio::test]
    async fn dispatch_makes_exactly_one_call() {
        let mock = MockExchange::default();
        let resp = dispatch(NormalizedCommand::Cancel { symbol: "BTCUSDT".into() }, &mock)
            .await
            .unwrap();
        assert_eq!(resp["retCode"], 0);
        assert_eq!(
            mock.calls(),
            vec![Call::CancelAll(CancelAllRequest { category: Category::Linear, symbol: "BTCUSDT".into() })]
        );
    }

    #[tokio::test]
    async fn exchange_error_is_propagated() {
        let mock = MockExchange::failing();
        let err = dispatch(
            NormalizedCommand::ExitLong { symbol: "BTCUSDT".into(), qty: amt(dec!(1)) },
            &mock,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DispatchError::Exchange(ExchangeError::Api { ret_code: 10001, .. })));
        assert_eq!(mock.calls().len(), 1);
    }
}
