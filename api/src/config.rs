use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::{env, fmt, net::SocketAddr, num::NonZeroU32, str::FromStr, time};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

const DEFAULT_LOGIN_ATTEMPTS: NonZeroU32 = NonZeroU32::new(10).unwrap();

/// HMAC signing secret. Never printed.
#[derive(Clone)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(**********)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: SecretKey,
    pub algorithm: Algorithm,
    pub access_token_ttl: Duration,
    pub bind_addr: SocketAddr,
    pub bcrypt_cost: u32,
    pub login_attempts_per_minute: NonZeroU32,
    pub request_timeout: time::Duration,
    pub max_concurrent_requests: usize,
}

impl Config {
    /// Defaults for everything except the secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret_key: SecretKey::new(secret),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(30),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            login_attempts_per_minute: DEFAULT_LOGIN_ATTEMPTS,
            request_timeout: time::Duration::from_secs(10),
            max_concurrent_requests: 1024,
        }
    }

    /// Reads `.env` first; real environment variables win over it.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("SECRET_KEY")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("SECRET_KEY"))?;
        let mut config = Self::with_secret(secret);

        if let Some(value) = lookup("ALGORITHM") {
            config.algorithm = match Algorithm::from_str(&value) {
                Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
                _ => return Err(ConfigError::Invalid { key: "ALGORITHM", value }),
            };
        }

        let minutes: i64 = parse(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        if minutes <= 0 {
            return Err(invalid("ACCESS_TOKEN_EXPIRE_MINUTES", minutes));
        }
        config.access_token_ttl = Duration::minutes(minutes);

        config.bind_addr = parse(&lookup, "BIND_ADDR", config.bind_addr)?;

        config.bcrypt_cost = parse(&lookup, "BCRYPT_COST", config.bcrypt_cost)?;
        if !(4..=31).contains(&config.bcrypt_cost) {
            return Err(invalid("BCRYPT_COST", config.bcrypt_cost));
        }

        config.login_attempts_per_minute =
            parse(&lookup, "LOGIN_ATTEMPTS_PER_MINUTE", config.login_attempts_per_minute)?;

        let timeout_secs: u64 = parse(&lookup, "REQUEST_TIMEOUT_SECS", 10)?;
        if timeout_secs == 0 {
            return Err(invalid("REQUEST_TIMEOUT_SECS", 0));
        }
        config.request_timeout = time::Duration::from_secs(timeout_secs);

        config.max_concurrent_requests =
            parse(&lookup, "MAX_CONCURRENT_REQUESTS", config.max_concurrent_requests)?;
        if config.max_concurrent_requests == 0 {
            return Err(invalid("MAX_CONCURRENT_REQUESTS", 0));
        }

        Ok(config)
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}
