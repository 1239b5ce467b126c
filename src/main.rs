// ===============================
// src/main.rs
// ===============================
/*
 # jalankan (testnet)
 BYBIT_API_KEY=... BYBIT_API_SECRET=... BYBIT_TESTNET=true cargo run

 # kirim sinyal contoh
curl -s -XPOST localhost:5000/webhook -H 'content-type: application/json' \
  -d '{"action":"entry_long","symbol":"ETHUSDT.P","qty":1,"price":2000}'

curl -s localhost:5000/metrics | grep '^webhook_requests_total'
*/
/*
=============================================================================
Project : webhook_bot_rust — TradingView webhook to Bybit order bridge
Module  : main.rs
Version : 0.1.0
Author  : Kukuh Tripamungkas Wicaksono (Kukuh TW)
Email   : kukuhtw@gmail.com
WhatsApp: https://wa.me/628129893706
LinkedIn: https://id.linkedin.com/in/kukuhtw
License : MIT (see LICENSE)

Summary : Receives TradingView alert webhooks, validates and normalizes the
          signal, and maps it to Bybit V5 linear-perpetual orders (limit
          entry, reduce-only market exit, cancel-all). Exposes a health
          check and Prometheus metrics.

(c) 2025 Kukuh TW. All rights reserved where applicable.
=============================================================================
*/
mod domain;
mod config;
mod metrics;
mod validator;
mod dispatcher;
mod exchange;
mod bybit;            // Bybit V5 REST client (signed)
mod server;           // hyper: /webhook, /, /metrics

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::bybit::BybitClient;
use crate::exchange::ExchangeClient;

#[tokio::main]
async fn main() {
    // ---- Logging ----
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ---- Load config ----
    let settings = match config::load() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // ---- Metrics ----
    metrics::init();
    metrics::CONFIG_TESTNET.set(i64::from(settings.env == config::BybitEnv::Testnet));

    info!(
        env = %settings.env.as_str(),
        rest_url = %settings.rest_url,
        recv_window = settings.recv_window,
        http_timeout_ms = settings.http_timeout_ms,
        port = settings.port,
        "startup config"
    );

    // ---- Exchange client (dibuat sekali, dipakai semua request) ----
    let exchange: Arc<dyn ExchangeClient> = match BybitClient::new(&settings) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!(error = %e, "bybit client init failed");
            std::process::exit(1);
        }
    };

    // ---- HTTP server ----
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    if let Err(e) = server::serve(addr, exchange).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
