use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    // Document store
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Cache
    pub redis_url: Option<String>,
    pub redis_token: Option<String>,
    pub cache_ttl_secs: u64,
    pub cache_timeout_ms: u64,

    // Analysis
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub analysis_timeout_secs: u64,
    pub analyze_rate_limit_per_min: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            frontend_url: "http://localhost:3000".into(),
            cors_extra_origins: Vec::new(),
            database_url: None,
            database_max_connections: 10,
            redis_url: None,
            redis_token: None,
            cache_ttl_secs: 300,
            cache_timeout_ms: 5000,
            gemini_api_key: None,
            gemini_model: "gemini-flash-latest".into(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            analysis_timeout_secs: 60,
            analyze_rate_limit_per_min: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_or(&var, "PORT", "port number", defaults.port)?,
            frontend_url: var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            cors_extra_origins: var("CORS_EXTRA_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            database_url: var("DATABASE_URL"),
            database_max_connections: parse_or(
                &var,
                "DATABASE_MAX_CONNECTIONS",
                "connection count",
                defaults.database_max_connections,
            )?,

            redis_url: var("REDIS_URL"),
            redis_token: var("REDIS_TOKEN"),
            cache_ttl_secs: parse_or(&var, "CACHE_TTL_SECS", "number of seconds", defaults.cache_ttl_secs)?,
            cache_timeout_ms: parse_or(
                &var,
                "CACHE_TIMEOUT_MS",
                "number of milliseconds",
                defaults.cache_timeout_ms,
            )?,

            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: var("GEMINI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini_base_url),
            analysis_timeout_secs: parse_or(
                &var,
                "ANALYSIS_TIMEOUT_SECS",
                "number of seconds",
                defaults.analysis_timeout_secs,
            )?,
            analyze_rate_limit_per_min: parse_or(
                &var,
                "ANALYZE_RATE_LIMIT_PER_MIN",
                "request count",
                defaults.analyze_rate_limit_per_min,
            )?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, expected: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}
