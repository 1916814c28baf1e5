use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::Duration;

use crate::workflows::compliance::ContraindicationMatching;
use crate::workflows::directory::UserRef;
use crate::workflows::examinations::FinalReviewerPolicy;
use crate::workflows::ids::UserId;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub workflow: WorkflowSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            workflow: WorkflowSettings::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the examination, scheduling and signature workflows.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Number of digits in a signature OTP.
    pub otp_length: usize,
    /// How long an OTP stays valid after it was sent.
    pub otp_ttl: Duration,
    /// Clinic throughput used when an organization has no capacity of its own.
    pub default_capacity: u32,
    pub final_reviewer_policy: FinalReviewerPolicy,
    pub contraindication_matching: ContraindicationMatching,
    /// Extra attempts a transaction gets after losing an optimistic commit race.
    pub transaction_retries: u32,
    /// Signer for the regulator role, if one is configured.
    pub regulator_signer: Option<UserRef>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            otp_length: 6,
            otp_ttl: Duration::seconds(300),
            default_capacity: 50,
            final_reviewer_policy: FinalReviewerPolicy::default(),
            contraindication_matching: ContraindicationMatching::default(),
            transaction_retries: 3,
            regulator_signer: None,
        }
    }
}

impl WorkflowSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let otp_length = read_number("WORKFLOW_OTP_LENGTH", defaults.otp_length)?;
        if !(4..=12).contains(&otp_length) {
            return Err(invalid("WORKFLOW_OTP_LENGTH", otp_length.to_string()));
        }

        let ttl_seconds = read_number("WORKFLOW_OTP_TTL_SECONDS", 300_i64)?;
        if ttl_seconds <= 0 {
            return Err(invalid("WORKFLOW_OTP_TTL_SECONDS", ttl_seconds.to_string()));
        }

        let default_capacity = read_number("WORKFLOW_DEFAULT_CAPACITY", defaults.default_capacity)?;
        if default_capacity == 0 {
            return Err(invalid("WORKFLOW_DEFAULT_CAPACITY", "0".to_string()));
        }

        let final_reviewer_policy = match env::var("WORKFLOW_FINAL_REVIEWER_POLICY") {
            Ok(raw) => FinalReviewerPolicy::parse(&raw)
                .ok_or_else(|| invalid("WORKFLOW_FINAL_REVIEWER_POLICY", raw))?,
            Err(_) => defaults.final_reviewer_policy,
        };

        let contraindication_matching = match env::var("WORKFLOW_CONTRAINDICATION_MATCHING") {
            Ok(raw) => ContraindicationMatching::parse(&raw)
                .ok_or_else(|| invalid("WORKFLOW_CONTRAINDICATION_MATCHING", raw))?,
            Err(_) => defaults.contraindication_matching,
        };

        let transaction_retries =
            read_number("WORKFLOW_TRANSACTION_RETRIES", defaults.transaction_retries)?;

        let regulator_signer = match env::var("WORKFLOW_REGULATOR_SIGNER") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_signer(&raw)?),
            _ => None,
        };

        Ok(Self {
            otp_length,
            otp_ttl: Duration::seconds(ttl_seconds),
            default_capacity,
            final_reviewer_policy,
            contraindication_matching,
            transaction_retries,
            regulator_signer,
        })
    }
}

fn read_number<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| invalid(key, raw)),
        Err(_) => Ok(default),
    }
}

/// Parses `<user id>:<phone>`.
fn parse_signer(raw: &str) -> Result<UserRef, ConfigError> {
    let (id, phone) = raw
        .split_once(':')
        .ok_or_else(|| invalid("WORKFLOW_REGULATOR_SIGNER", raw.to_string()))?;
    let id = id
        .trim()
        .parse::<u64>()
        .map_err(|_| invalid("WORKFLOW_REGULATOR_SIGNER", raw.to_string()))?;
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(invalid("WORKFLOW_REGULATOR_SIGNER", raw.to_string()));
    }

    Ok(UserRef {
        id: UserId(id),
        phone: phone.to_string(),
    })
}

fn invalid(key: &'static str, value: String) -> ConfigError {
    ConfigError::InvalidWorkflowSetting { key, value }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidWorkflowSetting { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidWorkflowSetting { key, value } => {
                write!(f, "{key} has an unsupported value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidWorkflowSetting { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "WORKFLOW_OTP_LENGTH",
            "WORKFLOW_OTP_TTL_SECONDS",
            "WORKFLOW_DEFAULT_CAPACITY",
            "WORKFLOW_FINAL_REVIEWER_POLICY",
            "WORKFLOW_CONTRAINDICATION_MATCHING",
            "WORKFLOW_TRANSACTION_RETRIES",
            "WORKFLOW_REGULATOR_SIGNER",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.workflow.otp_length, 6);
        assert_eq!(config.workflow.otp_ttl, Duration::minutes(5));
        assert_eq!(config.workflow.default_capacity, 50);
        assert_eq!(
            config.workflow.final_reviewer_policy,
            FinalReviewerPolicy::FallbackToAnyActiveDoctor
        );
        assert_eq!(
            config.workflow.contraindication_matching,
            ContraindicationMatching::PerChannel
        );
        assert!(config.workflow.regulator_signer.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_workflow_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WORKFLOW_OTP_LENGTH", "8");
        env::set_var("WORKFLOW_OTP_TTL_SECONDS", "120");
        env::set_var("WORKFLOW_FINAL_REVIEWER_POLICY", "strict");
        env::set_var("WORKFLOW_CONTRAINDICATION_MATCHING", "deduplicated");
        env::set_var("WORKFLOW_REGULATOR_SIGNER", "77:+77010000077");

        let settings = WorkflowSettings::from_env().expect("settings load");
        assert_eq!(settings.otp_length, 8);
        assert_eq!(settings.otp_ttl, Duration::seconds(120));
        assert_eq!(
            settings.final_reviewer_policy,
            FinalReviewerPolicy::StrictRoleAssignment
        );
        assert_eq!(
            settings.contraindication_matching,
            ContraindicationMatching::Deduplicated
        );
        let signer = settings.regulator_signer.expect("regulator configured");
        assert_eq!(signer.id, UserId(77));
        assert_eq!(signer.phone, "+77010000077");
        reset_env();
    }

    #[test]
    fn rejects_unknown_reviewer_policy() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WORKFLOW_FINAL_REVIEWER_POLICY", "whoever");

        match WorkflowSettings::from_env() {
            Err(ConfigError::InvalidWorkflowSetting { key, value }) => {
                assert_eq!(key, "WORKFLOW_FINAL_REVIEWER_POLICY");
                assert_eq!(value, "whoever");
            }
            other => panic!("expected invalid workflow setting, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_malformed_regulator_signer() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WORKFLOW_REGULATOR_SIGNER", "regulator");

        assert!(matches!(
            WorkflowSettings::from_env(),
            Err(ConfigError::InvalidWorkflowSetting { .. })
        ));
        reset_env();
    }
}
