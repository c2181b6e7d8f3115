use std::env;

/// Fallback signing secret for local development and tests.
const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
/// Eight hours, the length of a labeling shift.
const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// AppConfig
///
/// Holds the service configuration. Immutable once loaded and shared through
/// `AppState` via `FromRef`, so the session extractor and the gate read the same values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local `x-user-id` bypass and log format.
    pub env: Env,
    // HS256 secret used to sign and verify session tokens.
    pub jwt_secret: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Lifetime of an issued session token and its cookie.
    pub session_ttl_secs: u64,
    // Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
}

/// Env
///
/// Runtime context: local development conveniences versus hardened production settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for test scaffolding; no environment variables needed.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            cookie_secure: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads configuration from environment variables at startup, failing fast on
    /// anything production cannot run without.
    ///
    /// # Panics
    /// Panics in production when `SESSION_JWT_SECRET` is not set, so the service never
    /// starts signing sessions with the public development secret.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_default().as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("SESSION_JWT_SECRET")
                .expect("FATAL: SESSION_JWT_SECRET must be set in production."),
            Env::Local => {
                env::var("SESSION_JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string())
            }
        };

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or(env == Env::Production);

        Self {
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            session_ttl_secs,
            cookie_secure,
            env,
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}
