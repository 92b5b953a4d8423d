use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub features: FeatureFlags,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Public storefront URL. Used for CORS in production and for links in email.
    pub base_url: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_environment() -> String {
    "development".to_string()
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    5
}
fn default_acquire_timeout() -> u64 {
    3
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub webhook_secret: Option<String>,
    #[serde(default = "default_tolerance")]
    pub signature_tolerance_secs: i64,
}

fn default_tolerance() -> i64 {
    caldera_core::payment::DEFAULT_TOLERANCE_SECS
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            signature_tolerance_secs: default_tolerance(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_email_api")]
    pub api_url: String,
    #[serde(default = "default_from")]
    pub from_address: String,
}

fn default_email_api() -> String {
    "https://api.resend.com".to_string()
}
fn default_from() -> String {
    "noreply@caldera.travel".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_email_api(),
            from_address: default_from(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub concierge: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self { concierge: true }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `CALDERA__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("CALDERA").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Rejects configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        let mut missing = Vec::new();
        if self.database.url.trim().is_empty() {
            missing.push("database.url");
        }
        if self.server.base_url.trim().is_empty() {
            missing.push("server.base_url");
        }
        if self.payments.webhook_secret.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("payments.webhook_secret");
        }
        if self.email.api_key.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("email.api_key");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("missing required configuration: {}", missing.join(", ")))
        }
    }
}
