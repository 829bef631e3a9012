use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub search: SearchSettings,
    pub breaker: BreakerSettings,
    pub retry: RetrySettings,
    pub dispatch: DispatchSettings,
    pub upload: UploadSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub data_root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(ssl_mode)
            .database(&self.database_name)
    }
}

/// Which implementation of [`crate::search::SearchClient`] is wired live at
/// startup. Switching requires a restart (spec.md §4.1).
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActiveSearchBackend {
    Primary,
    Backup,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    pub active_backend: ActiveSearchBackend,
    pub primary_search_url: String,
    pub backup_search_url: String,
    pub request_timeout_s: u64,
}

impl SearchSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BreakerSettings {
    pub window: usize,
    pub minimum_calls: usize,
    pub failure_rate_threshold: f64,
    pub slow_call_duration_s: u64,
    pub slow_call_rate_threshold: f64,
    pub open_duration_s: u64,
    pub half_open_probes: usize,
}

impl BreakerSettings {
    pub fn slow_call_duration(&self) -> Duration {
        Duration::from_secs(self.slow_call_duration_s)
    }

    pub fn open_duration(&self) -> Duration {
        Duration::from_secs(self.open_duration_s)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: i32,
    pub embed_interval_s: u64,
    pub delete_interval_s: u64,
    pub batch_size: i64,
    pub retention_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    pub workers: usize,
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    pub allowed_extensions: Vec<String>,
    pub max_file_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub ttl_hours: i64,
}

/// Loads layered configuration: `configuration/base.yaml`, then
/// `configuration/{environment}.yaml`, then `APP_`-prefixed environment
/// variables, matching the teacher's `config` crate dependency.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("failed to determine current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("failed to parse APP_ENVIRONMENT");

    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use `local` or `production`."
            )),
        }
    }
}
