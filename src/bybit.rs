// ===============================
// src/bybit.rs
// ===============================
//
// Bybit V5 REST (unified trading): hanya dua endpoint yang dipakai bot,
// `order/create` dan `order/cancel-all`. Semua request ditandatangani
// HMAC-SHA256 (sign type 2).
//
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::domain::{CancelAllRequest, OrderRequest};
use crate::exchange::{ExchangeClient, ExchangeError};

const PATH_ORDER_CREATE: &str = "/v5/order/create";
const PATH_CANCEL_ALL: &str = "/v5/order/cancel-all";

pub fn timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// V5 pre-hash string for POST: `timestamp + api_key + recv_window + body`.
pub fn prehash(timestamp: i64, api_key: &str, recv_window: u64, body: &str) -> String {
    format!("{timestamp}{api_key}{recv_window}{body}")
}

pub fn sign(secret: &str, payload: &str) -> Result<String, ExchangeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Signing(e.to_string()))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

// ---- Minimal response envelope ----
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
}

/// Classify a raw HTTP reply. The full JSON is returned untouched on success.
fn interpret(status: u16, body: &str) -> Result<Value, ExchangeError> {
    if !(200..300).contains(&status) {
        return Err(ExchangeError::Http { status, body: body.to_string() });
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| ExchangeError::Decode(e.to_string()))?;
    let env: Envelope =
        serde_json::from_value(value.clone()).map_err(|e| ExchangeError::Decode(e.to_string()))?;
    if env.ret_code != 0 {
        return Err(ExchangeError::Api { ret_code: env.ret_code, ret_msg: env.ret_msg });
    }
    Ok(value)
}

pub struct BybitClient {
    http: reqwest::Client,
    rest_base: String,
    api_key: String,
    api_secret: String,
    recv_window: u64,
}

impl BybitClient {
    pub fn new(settings: &Settings) -> Result<Self, ExchangeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.http_timeout_ms))
            .build()
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            rest_base: settings.rest_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            recv_window: settings.recv_window,
        })
    }

    async fn post_signed<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Value, ExchangeError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ExchangeError::Decode(e.to_string()))?;
        let ts = timestamp_ms();
        let sig = sign(&self.api_secret, &prehash(ts, &self.api_key, self.recv_window, &body))?;
        let url = format!("{}{}", self.rest_base, path);
        debug!(%url, %body, "bybit request");

        let rsp = self
            .http
            .post(&url)
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-TIMESTAMP", ts.to_string())
            .header("X-BAPI-RECV-WINDOW", self.recv_window.to_string())
            .header("X-BAPI-SIGN", sig)
            .header("X-BAPI-SIGN-TYPE", "2")
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = rsp.status().as_u16();
        let text = rsp
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        let result = interpret(status, &text);
        if let Err(e) = &result {
            warn!(%path, error = %e, "bybit request failed");
        }
        result
    }
}

#[async_trait]
impl ExchangeClient for BybitClient {
    async fn place_order(&self, req: &OrderRequest) -> Result<Value, ExchangeError> {
        self.post_signed(PATH_ORDER_CREATE, req).await
    }

    async fn cancel_all_orders(&self, req: &CancelAllRequest) -> Result<Value, ExchangeError> {
        self.post_signed(PATH_CANCEL_ALL, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_matches_reference_vector() {
        let body = r#"{"category":"linear","symbol":"BTCUSDT"}"#;
        let pre = prehash(1_700_000_000_000, "test-key", 5000, body);
        assert_eq!(pre, r#"1700000000000test-key5000{"category":"linear","symbol":"BTCUSDT"}"#);
        assert_eq!(
            sign("test-secret", &pre).unwrap(),
            "16378a8ca3caa3c068e2e74ef209dad5c036fec4047c7582ddcfcf13323a8275"
        );
    }

    #[test]
    fn ok_response_is_relayed_verbatim() {
        let body = r#"{"retCode":0,"retMsg":"OK","result":{"orderId":"abc"},"time":1}"#;
        let v = interpret(200, body).unwrap();
        assert_eq!(v["result"]["orderId"], "abc");
        assert_eq!(v["time"], 1);
    }

    #[test]
    fn non_zero_ret_code_is_an_error() {
        let body = r#"{"retCode":110007,"retMsg":"ab not enough for new order"}"#;
        match interpret(200, body) {
            Err(ExchangeError::Api { ret_code, ret_msg }) => {
                assert_eq!(ret_code, 110007);
                assert_eq!(ret_msg, "ab not enough for new order");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn http_and_decode_failures() {
        assert!(matches!(interpret(403, "forbidden"), Err(ExchangeError::Http { status: 403, .. })));
        assert!(matches!(interpret(200, "<html>"), Err(ExchangeError::Decode(_))));
    }
}
