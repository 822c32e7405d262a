use std::env;

use chrono::Duration;
use dbk_common::{parse_boolean_flag, Secret};
use log::*;
use midtrans_tools::MidtransConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::errors::ServerError;

const DEFAULT_DBK_HOST: &str = "127.0.0.1";
const DEFAULT_DBK_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/booking.db";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;
const DEFAULT_SESSION_DURATION: Duration = Duration::days(7);
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    pub auth: AuthConfig,
    /// Mark the session cookie `Secure`. Turn this on whenever the server sits behind HTTPS.
    pub secure_cookies: bool,
    /// Verify the `signature_key` on incoming Midtrans notifications.
    pub signature_checks: bool,
    pub midtrans: MidtransConfig,
    /// Seed the Bronze, Silver and Gold packages into an empty catalog at start-up.
    pub seed_catalog: bool,
    /// Accounts with these emails are given the admin role at start-up.
    pub admin_emails: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DBK_HOST.to_string(),
            port: DEFAULT_DBK_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            auth: AuthConfig::default(),
            secure_cookies: false,
            signature_checks: true,
            midtrans: MidtransConfig::default(),
            seed_catalog: false,
            admin_emails: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("DBK_HOST").ok().unwrap_or_else(|| DEFAULT_DBK_HOST.into());
        let port = env::var("DBK_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for DBK_PORT. {e} Using the default, {DEFAULT_DBK_PORT}, instead."
                    );
                    DEFAULT_DBK_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_DBK_PORT);
        let database_url = env::var("DBK_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ DBK_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_db_connections = env::var("DBK_MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for DBK_MAX_DB_CONNECTIONS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_DB_CONNECTIONS);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let secure_cookies = parse_boolean_flag(env::var("DBK_SECURE_COOKIES").ok(), false);
        let signature_checks = parse_boolean_flag(env::var("DBK_MIDTRANS_SIGNATURE_CHECKS").ok(), true);
        if !signature_checks {
            warn!(
                "🚨️ Midtrans notification signatures will NOT be checked. Anyone can mark orders as paid. Only use \
                 this setting for local testing."
            );
        }
        let midtrans = MidtransConfig::new_from_env_or_default();
        if signature_checks && midtrans.server_key.is_blank() {
            warn!("🪛️ No Midtrans server key is configured. Every payment notification will be rejected.");
        }
        let seed_catalog = parse_boolean_flag(env::var("DBK_SEED_CATALOG").ok(), false);
        let admin_emails = env::var("DBK_ADMIN_EMAILS").map(|s| parse_email_list(&s)).unwrap_or_default();
        Self {
            host,
            port,
            database_url,
            max_db_connections,
            auth,
            secure_cookies,
            signature_checks,
            midtrans,
            seed_catalog,
            admin_emails,
        }
    }
}

fn parse_email_list(s: &str) -> Vec<String> {
    s.split(',').map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()).collect()
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC key used to sign and verify session tokens.
    pub jwt_secret: Secret<String>,
    /// How long a session token is valid for.
    pub session_duration: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. Every session will be \
             invalidated when the server restarts. DO NOT operate on production like this. Set DBK_JWT_SECRET \
             instead. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), session_duration: DEFAULT_SESSION_DURATION }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()), session_duration: DEFAULT_SESSION_DURATION }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let jwt_secret = Secret::from_env("DBK_JWT_SECRET")
            .ok_or_else(|| ServerError::ConfigurationError("DBK_JWT_SECRET is not set".into()))?;
        if jwt_secret.reveal().len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "DBK_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self { jwt_secret, session_duration: DEFAULT_SESSION_DURATION })
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that route handlers need. Secrets stay out of it, with the exception of the
/// Midtrans server key, which is needed to verify notification signatures.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub secure_cookies: bool,
    pub session_duration: Duration,
    pub signature_checks: bool,
    pub midtrans_server_key: Secret<String>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            secure_cookies: config.secure_cookies,
            session_duration: config.auth.session_duration,
            signature_checks: config.signature_checks,
            midtrans_server_key: config.midtrans.server_key.clone(),
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            secure_cookies: false,
            session_duration: DEFAULT_SESSION_DURATION,
            signature_checks: true,
            midtrans_server_key: Secret::default(),
        }
    }
}
