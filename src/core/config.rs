use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use crate::models::payments::OperationKind;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub server: BillingServerConfig,
    pub redis: RedisConfig,
    pub backend: BackendConfig,
    pub gateway: GatewayConfig,
    pub jwt_auth_config: JwtAuthConfig,
    #[serde(default)]
    pub payments: PaymentTimingConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self, config::ConfigError> {
        let base_path = std::env::current_dir()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        let config_dir = base_path.join("src/core/configurations");

        let app_environment: Environment = std::env::var("JOURNAL_BILLING_APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(config::ConfigError::Message)?;

        let configurations = config::Config::builder()
            .add_source(
                config::File::from(config_dir.join(app_environment.as_str())).required(true),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        configurations.try_deserialize()
    }
}

#[derive(Deserialize, Clone)]
pub struct BillingServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: String,
    pub password: Option<String>,
}

impl RedisConfig {
    pub fn connect(&self) -> Result<redis::Client, redis::RedisError> {
        let url = format!(
            "redis://:{password}@{host}:{port}",
            password = self.password.as_deref().unwrap_or(""),
            host = self.host,
            port = self.port
        );
        redis::Client::open(url)
    }
}

/// Backend-as-a-service hosting the payment, registration and document functions.
#[derive(Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub anon_key: Secret<String>,
    pub timeout_ms: u64,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Deserialize, Clone)]
pub struct GatewayConfig {
    /// The only origin whose frame messages are trusted.
    pub origin: String,
    pub terminal_number: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "he".to_string()
}

#[derive(Deserialize, Clone)]
pub struct JwtAuthConfig {
    pub secret: Secret<String>,
    pub token_expiration_time: i64,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PaymentTimingConfig {
    pub initial_poll_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub tokenization_concern_secs: u64,
    pub charge_concern_secs: u64,
    /// How long a finished session stays readable before it is evicted.
    pub settled_flow_grace_secs: u64,
    /// Sessions that never finish are evicted after this long.
    pub abandoned_flow_ttl_secs: u64,
    pub eviction_interval_secs: u64,
}

impl Default for PaymentTimingConfig {
    fn default() -> Self {
        Self {
            initial_poll_delay_ms: 5_000,
            poll_interval_ms: 3_000,
            max_poll_attempts: 40,
            tokenization_concern_secs: 30,
            charge_concern_secs: 60,
            settled_flow_grace_secs: 600,
            abandoned_flow_ttl_secs: 3_600,
            eviction_interval_secs: 60,
        }
    }
}

impl PaymentTimingConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_poll_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settled_flow_grace(&self) -> Duration {
        Duration::from_secs(self.settled_flow_grace_secs)
    }

    pub fn abandoned_flow_ttl(&self) -> Duration {
        Duration::from_secs(self.abandoned_flow_ttl_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs.max(1))
    }

    /// How long an operation may run before the user is told it is slow.
    pub fn concern_threshold(&self, operation: OperationKind) -> Duration {
        match operation {
            OperationKind::Tokenization => Duration::from_secs(self.tokenization_concern_secs),
            OperationKind::Charge => Duration::from_secs(self.charge_concern_secs),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct RegistrationConfig {
    pub draft_ttl_minutes: i64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            draft_ttl_minutes: 30,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct RecoveryConfig {
    pub session_ttl_hours: i64,
    pub max_repair_attempts: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24,
            max_repair_attempts: 3,
        }
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Sandbox,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not supported environment. Use either `local`, `sandbox` or `production` ",
                other
            )),
        }
    }
}
