// ===============================
// src/server.rs
// ===============================
//
// Endpoint:
//   GET  /          -> health check
//   GET  /metrics   -> Prometheus text
//   POST /webhook   -> validate -> dispatch -> relay respons exchange
//
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::HttpBody;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::dispatcher::{self, DispatchError};
use crate::exchange::ExchangeClient;
use crate::metrics::{encode_metrics, WEBHOOKS};
use crate::validator::{self, ValidationError};

/// Bodies above this size are refused before parsing.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

fn json_response(status: StatusCode, body: Value) -> Response<Body> {
    let mut rsp = Response::new(Body::from(body.to_string()));
    *rsp.status_mut() = status;
    rsp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    rsp
}

fn error_response(status: StatusCode, msg: &str) -> Response<Body> {
    json_response(status, json!({ "error": msg }))
}

pub async fn handle(
    req: Request<Body>,
    exchange: Arc<dyn ExchangeClient>,
) -> Result<Response<Body>, Infallible> {
    let rsp = match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => json_response(
            StatusCode::OK,
            json!({"status": "ok", "message": "Webhook bot is running"}),
        ),
        (&Method::GET, "/metrics") => {
            let mut rsp = Response::new(Body::from(encode_metrics()));
            rsp.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
            );
            rsp
        }
        (&Method::POST, "/webhook") => webhook(req, exchange.as_ref()).await,
        (_, "/") | (_, "/metrics") | (_, "/webhook") => {
            error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
        _ => error_response(StatusCode::NOT_FOUND, "Not found"),
    };
    Ok(rsp)
}

enum BodyError {
    TooLarge,
    Read(hyper::Error),
}

/// Collect the body chunk by chunk, giving up as soon as it passes `limit`.
async fn read_limited(mut body: Body, limit: u64) -> Result<Vec<u8>, BodyError> {
    let mut buf = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(BodyError::Read)?;
        if (buf.len() + chunk.len()) as u64 > limit {
            return Err(BodyError::TooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn webhook(req: Request<Body>, exchange: &dyn ExchangeClient) -> Response<Body> {
    let declared_too_large = req
        .headers()
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(false, |len| len > MAX_BODY_BYTES);
    if declared_too_large {
        return too_large();
    }

    let body = match read_limited(req.into_body(), MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(BodyError::TooLarge) => return too_large(),
        Err(BodyError::Read(e)) => {
            error!(error = %e, "read body failed");
            WEBHOOKS.with_label_values(&["unknown", "failed"]).inc();
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    let cmd = match validator::validate_bytes(&body) {
        Ok(cmd) => cmd,
        Err(e) => return rejected(e),
    };

    let action = cmd.action();
    let symbol = cmd.symbol().to_string();
    match dispatcher::dispatch(cmd, exchange).await {
        Ok(response) => {
            info!(%action, %symbol, "webhook handled");
            WEBHOOKS.with_label_values(&[action.as_str(), "ok"]).inc();
            json_response(
                StatusCode::OK,
                json!({"success": true, "action": action.as_str(), "response": response}),
            )
        }
        Err(DispatchError::Exchange(e)) => {
            // detail hanya di log; klien cukup pesan generik
            error!(%action, %symbol, error = %e, "webhook failed");
            WEBHOOKS.with_label_values(&[action.as_str(), "failed"]).inc();
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn too_large() -> Response<Body> {
    warn!(limit = MAX_BODY_BYTES, "webhook rejected: payload too large");
    WEBHOOKS.with_label_values(&["invalid", "rejected"]).inc();
    error_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large")
}

fn rejected(e: ValidationError) -> Response<Body> {
    let label = match &e {
        ValidationError::MissingForAction { action, .. } => action.as_str(),
        _ => "invalid",
    };
    warn!(error = %e, "webhook rejected");
    WEBHOOKS.with_label_values(&[label, "rejected"]).inc();
    error_response(StatusCode::BAD_REQUEST, &e.to_string())
}

pub async fn serve(addr: SocketAddr, exchange: Arc<dyn ExchangeClient>) -> Result<(), hyper::Error> {
    let make_svc = make_service_fn(move |_conn| {
        let exchange = exchange.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle(req, exchange.clone())))
        }
    });

    info!(%addr, "webhook server listening");
    Server::bind(&addr)
        .serve(make_svc)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
}
