// ===============================
// src/exchange.rs
// ===============================
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{CancelAllRequest, OrderRequest};

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("exchange rejected request (retCode {ret_code}): {ret_msg}")]
    Api { ret_code: i64, ret_msg: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Outbound side of the bot. Responses are relayed verbatim.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn place_order(&self, req: &OrderRequest) -> Result<Value, ExchangeError>;

    async fn cancel_all_orders(&self, req: &CancelAllRequest) -> Result<Value, ExchangeError>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Place(OrderRequest),
        CancelAll(CancelAllRequest),
    }

    /// Records every call; answers `{"retCode":0}` unless `failing`.
    #[derive(Debug, Default)]
    pub struct MockExchange {
        pub calls: Mutex<Vec<Call>>,
        pub failing: bool,
    }

    impl MockExchange {
        pub fn failing() -> Self {
            Self { failing: true, ..Default::default() }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, call: Call) -> Result<Value, ExchangeError> {
            self.calls.lock().unwrap().push(call);
            if self.failing {
                return Err(ExchangeError::Api { ret_code: 10001, ret_msg: "params error".into() });
            }
            Ok(json!({"retCode": 0, "retMsg": "OK"}))
        }
    }

    #[async_trait]
    impl ExchangeClient for MockExchange {
        async fn place_order(&self, req: &OrderRequest) -> Result<Value, ExchangeError> {
            self.answer(Call::Place(req.clone()))
        }

        async fn cancel_all_orders(&self, req: &CancelAllRequest) -> Result<Value, ExchangeError> {
            self.answer(Call::CancelAll(req.clone()))
        }
    }
}
