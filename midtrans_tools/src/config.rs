use std::time::Duration;

use dbk_common::{parse_boolean_flag, Secret};
use log::*;

pub const SANDBOX_API_URL: &str = "https://app.sandbox.midtrans.com";
pub const PRODUCTION_API_URL: &str = "https://app.midtrans.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct MidtransConfig {
    pub server_key: Secret<String>,
    /// When false, all calls go to the sandbox environment.
    pub production: bool,
    /// Overrides the Snap host. Mostly useful for pointing the client at a local stub.
    pub api_url: Option<String>,
    pub timeout: Duration,
}

impl Default for MidtransConfig {
    fn default() -> Self {
        Self {
            server_key: Secret::default(),
            production: false,
            api_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl MidtransConfig {
    pub fn new_from_env_or_default() -> Self {
        let server_key = Secret::from_env("DBK_MIDTRANS_SERVER_KEY").unwrap_or_else(|| {
            warn!("🪛️ DBK_MIDTRANS_SERVER_KEY not set. Payment requests will be rejected by the gateway");
            Secret::default()
        });
        let production = parse_boolean_flag(std::env::var("DBK_MIDTRANS_PRODUCTION").ok(), false);
        if production {
            info!("🪛️ Midtrans client is using the PRODUCTION environment");
        } else {
            info!("🪛️ Midtrans client is using the sandbox environment");
        }
        let api_url = std::env::var("DBK_MIDTRANS_API_URL").ok();
        let timeout = std::env::var("DBK_MIDTRANS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for DBK_MIDTRANS_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { server_key, production, api_url, timeout }
    }

    pub fn base_url(&self) -> &str {
        match (&self.api_url, self.production) {
            (Some(url), _) => url.as_str(),
            (None, true) => PRODUCTION_API_URL,
            (None, false) => SANDBOX_API_URL,
        }
    }
}
