use thiserror::Error;

/// Secret used when `JWT_SECRET` is not set. Matches the tokens issued by the
/// existing partner login, so local setups keep working.
pub const DEFAULT_JWT_SECRET: &str = "exchange-secret-key";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` means the SQLite file under the asset directory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// True when `jwt_secret` fell back to [`DEFAULT_JWT_SECRET`].
    pub using_default_secret: bool,
    pub host: String,
    pub port: u16,
    pub enforce_location_ownership: bool,
    /// Empty allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            using_default_secret: true,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            enforce_location_ownership: true,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Config::default();

        let (jwt_secret, using_default_secret) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (defaults.jwt_secret, true),
        };

        let port = match get("PORT").or_else(|| get("BACKEND_PORT")) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: raw,
            })?,
            None => defaults.port,
        };

        let enforce_location_ownership = match get("ENFORCE_LOCATION_OWNERSHIP") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                name: "ENFORCE_LOCATION_OWNERSHIP",
                value: raw,
            })?,
            None => defaults.enforce_location_ownership,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty() && origin != "*")
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: get("DATABASE_URL"),
            jwt_secret,
            using_default_secret,
            host: get("HOST").unwrap_or(defaults.host),
            port,
            enforce_location_ownership,
            cors_allowed_origins,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
