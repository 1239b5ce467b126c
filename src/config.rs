// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : webhook_bot_rust — TradingView webhook to Bybit order bridge
Module  : config.rs
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
use clap::Parser;
use dotenvy::dotenv;
use thiserror::Error;

/// Lingkungan Bybit (testnet / mainnet)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BybitEnv {
    Mainnet,
    Testnet,
}

impl BybitEnv {
    pub fn from_flag(testnet: bool) -> Self {
        if testnet { BybitEnv::Testnet } else { BybitEnv::Mainnet }
    }

    pub fn default_rest_url(&self) -> &'static str {
        match self {
            BybitEnv::Mainnet => "https://api.bybit.com",
            BybitEnv::Testnet => "https://api-testnet.bybit.com",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BybitEnv::Mainnet => "mainnet",
            BybitEnv::Testnet => "testnet",
        }
    }
}

/// CLI flags; setiap flag juga bisa diisi lewat ENV / .env
#[derive(Parser, Clone, Debug)]
#[command(name = "webhook_bot_rust", version, about = "TradingView webhook -> Bybit orders")]
pub struct Args {
    #[arg(long, env = "BYBIT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "BYBIT_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Use the Bybit testnet endpoint
    #[arg(long, env = "BYBIT_TESTNET", value_parser = parse_truthy)]
    pub testnet: bool,

    /// Override the REST base URL
    #[arg(long, env = "BYBIT_REST_URL")]
    pub rest_url: Option<String>,

    #[arg(long, env = "BYBIT_RECV_WINDOW", default_value_t = 5000)]
    pub recv_window: u64,

    /// Timeout for a single exchange call
    #[arg(long, env = "HTTP_TIMEOUT_MS", default_value_t = 10_000)]
    pub http_timeout_ms: u64,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,
}

/// `true`/`1`/`yes`/`on` in any case; any other value is false, never an error.
fn parse_truthy(s: &str) -> Result<bool, std::convert::Infallible> {
    let v = s.trim();
    Ok(["true", "1", "yes", "on"].iter().any(|t| v.eq_ignore_ascii_case(t)))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BYBIT_API_KEY and BYBIT_API_SECRET must be set")]
    MissingCredentials,
    #[error("invalid REST url: {0}")]
    InvalidRestUrl(String),
}

/// Immutable runtime settings, built once at startup.
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_secret: String,
    pub env: BybitEnv,
    pub rest_url: String,
    pub recv_window: u64,
    pub http_timeout_ms: u64,
    pub port: u16,
}

// secret tidak boleh bocor ke log
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("env", &self.env)
            .field("rest_url", &self.rest_url)
            .field("recv_window", &self.recv_window)
            .field("http_timeout_ms", &self.http_timeout_ms)
            .field("port", &self.port)
            .finish()
    }
}

impl Settings {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let (api_key, api_secret) = match (non_empty(args.api_key), non_empty(args.api_secret)) {
            (Some(k), Some(s)) => (k, s),
            _ => return Err(ConfigError::MissingCredentials),
        };

        let env = BybitEnv::from_flag(args.testnet);
        let rest_url = match non_empty(args.rest_url) {
            Some(u) if u.starts_with("http://") || u.starts_with("https://") => u,
            Some(u) => return Err(ConfigError::InvalidRestUrl(u)),
            None => env.default_rest_url().to_string(),
        };

        Ok(Settings {
            api_key,
            api_secret,
            env,
            rest_url,
            recv_window: args.recv_window,
            http_timeout_ms: args.http_timeout_ms,
            port: args.port,
        })
    }
}

pub fn load() -> Result<Settings, ConfigError> {
    // Pastikan .env dibaca sebelum clap membaca ENV
    let _ = dotenv();
    Settings::from_args(Args::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            api_key: Some("key".into()),
            api_secret: Some("secret".into()),
            testnet: false,
            rest_url: None,
            recv_window: 5000,
            http_timeout_ms: 10_000,
            port: 5000,
        }
    }

    #[test]
    fn mainnet_by_default() {
        let s = Settings::from_args(args()).unwrap();
        assert_eq!(s.env, BybitEnv::Mainnet);
        assert_eq!(s.rest_url, "https://api.bybit.com");
    }

    #[test]
    fn testnet_flag_switches_endpoint() {
        let s = Settings::from_args(Args { testnet: true, ..args() }).unwrap();
        assert_eq!(s.env, BybitEnv::Testnet);
        assert_eq!(s.rest_url, "https://api-testnet.bybit.com");
    }

    #[test]
    fn rest_url_override() {
        let s = Settings::from_args(Args { rest_url: Some("http://127.0.0.1:9000".into()), ..args() }).unwrap();
        assert_eq!(s.rest_url, "http://127.0.0.1:9000");
        assert_eq!(
            Settings::from_args(Args { rest_url: Some("api.bybit.com".into()), ..args() }).unwrap_err(),
            ConfigError::InvalidRestUrl("api.bybit.com".into())
        );
    }

    #[test]
    fn credentials_required() {
        assert_eq!(
            Settings::from_args(Args { api_key: None, ..args() }).unwrap_err(),
            ConfigError::MissingCredentials
        );
        assert_eq!(
            Settings::from_args(Args { api_secret: Some("  ".into()), ..args() }).unwrap_err(),
            ConfigError::MissingCredentials
        );
    }

    #[test]
    fn flags_parse() {
        let a = Args::try_parse_from([
            "webhook_bot_rust",
            "--api-key",
            "k",
            "--api-secret",
            "s",
            "--testnet",
            "--port",
            "8080",
        ])
        .unwrap();
        assert!(a.testnet);
        assert_eq!(a.port, 8080);
    }

    #[test]
    fn testnet_env_is_case_insensitive() {
        let parse = |v: &str| {
            std::env::set_var("BYBIT_TESTNET", v);
            let a = Args::try_parse_from(["webhook_bot_rust", "--api-key", "k", "--api-secret", "s"]);
            std::env::remove_var("BYBIT_TESTNET");
            a.map(|a| a.testnet)
        };
        for v in ["true", "True", "TRUE", "1", "yes"] {
            assert_eq!(parse(v).unwrap(), true, "BYBIT_TESTNET={v}");
        }
        for v in ["false", "False", "0", "nope"] {
            assert_eq!(parse(v).unwrap(), false, "BYBIT_TESTNET={v}");
        }
    }

    #[test]
    fn parse_truthy_values() {
        assert_eq!(parse_truthy(" TRUE "), Ok(true));
        assert_eq!(parse_truthy("On"), Ok(true));
        assert_eq!(parse_truthy("maybe"), Ok(false));
    }

    #[test]
    fn debug_hides_secrets() {
        let s = Settings::from_args(args()).unwrap();
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("\"secret\""));
        assert!(!dbg.contains("\"key\""));
        assert!(dbg.contains("***"));
    }
}
