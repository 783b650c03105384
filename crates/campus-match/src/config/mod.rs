use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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
    pub engine: EngineConfig,
    pub sources: SourcesConfig,
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

        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            per_tier: numeric_var("RECS_PER_TIER", defaults.per_tier)?,
            max_fill_rounds: numeric_var("RECS_MAX_FILL_ROUNDS", defaults.max_fill_rounds)?,
            lookup_timeout: Duration::from_millis(numeric_var(
                "RECS_LOOKUP_TIMEOUT_MS",
                defaults.lookup_timeout.as_millis() as u64,
            )?),
            enrichment_budget: Duration::from_millis(numeric_var(
                "RECS_ENRICHMENT_BUDGET_MS",
                defaults.enrichment_budget.as_millis() as u64,
            )?),
            lookup_concurrency: numeric_var(
                "RECS_LOOKUP_CONCURRENCY",
                defaults.lookup_concurrency,
            )?,
            reference_dataset: optional_var("RECS_REFERENCE_DATASET").map(PathBuf::from),
            tables_path: optional_var("RECS_TABLES_PATH").map(PathBuf::from),
        };

        if engine.per_tier == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "RECS_PER_TIER",
                value: "0".to_string(),
            });
        }

        let sources = SourcesConfig {
            generator: optional_var("GENERATOR_BASE_URL").map(|base_url| GeneratorConfig {
                base_url,
                api_key: optional_var("GENERATOR_API_KEY"),
                model: env::var("GENERATOR_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            }),
            scorecard: optional_var("SCORECARD_API_KEY").map(|api_key| ScorecardConfig {
                api_key,
                base_url: env::var("SCORECARD_BASE_URL").unwrap_or_else(|_| {
                    "https://api.data.gov/ed/collegescorecard/v1".to_string()
                }),
            }),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: false,
                include_targets: environment != AppEnvironment::Production,
            },
            engine,
            sources,
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn numeric_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match optional_var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        None => Ok(default),
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
    pub ansi: bool,
    pub include_targets: bool,
}

/// Knobs for the pool balancer and the enrichment fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub per_tier: usize,
    pub max_fill_rounds: usize,
    pub lookup_timeout: Duration,
    pub enrichment_budget: Duration,
    pub lookup_concurrency: usize,
    pub reference_dataset: Option<PathBuf>,
    pub tables_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            per_tier: 3,
            max_fill_rounds: 2,
            lookup_timeout: Duration::from_millis(4_000),
            enrichment_budget: Duration::from_millis(12_000),
            lookup_concurrency: 8,
            reference_dataset: None,
            tables_path: None,
        }
    }
}

/// External collaborators. Absent sections fall back to disabled adapters.
#[derive(Debug, Clone, Default)]
pub struct SourcesConfig {
    pub generator: Option<GeneratorConfig>,
    pub scorecard: Option<ScorecardConfig>,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ScorecardConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    Tables { path: PathBuf, detail: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive number (found '{value}')")
            }
            ConfigError::Tables { path, detail } => {
                write!(
                    f,
                    "institution tables at {} could not be loaded: {}",
                    path.display(),
                    detail
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::Tables { .. } => None,
        }
    }
}
