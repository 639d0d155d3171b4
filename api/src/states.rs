use crate::{auth::TokenService, config::Config, db::Database};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{num::NonZeroU32, sync::Arc};
use tracing::debug;

/// Tracked login names past which idle limiter entries are swept.
pub const LOGIN_THROTTLE_SWEEP_AT: usize = 10_000;

// ============================================================================
// APPLICATION STATE - Shared data across all requests
// ============================================================================
/// Cloned into every handler. Everything mutable in here is internally
/// synchronized: the storage engine and the login throttle.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub login_throttle: Arc<LoginThrottle>,
    /// Checked against when the login email is unknown, so that path costs
    /// as much as a wrong password.
    pub dummy_hash: Arc<str>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, bcrypt::BcryptError> {
        Self::with_database(config, Database::new())
    }

    pub fn with_database(config: Config, db: Database) -> Result<Self, bcrypt::BcryptError> {
        let dummy_hash = bcrypt::hash("not-a-real-password", config.bcrypt_cost)?;

        Ok(Self {
            db,
            tokens: Arc::new(TokenService::from_config(&config)),
            login_throttle: Arc::new(LoginThrottle::new(
                config.login_attempts_per_minute,
                LOGIN_THROTTLE_SWEEP_AT,
            )),
            dummy_hash: dummy_hash.into(),
            config: Arc::new(config),
        })
    }
}

/// Per-login-name attempt limiter. Any string can be a key, so entries whose
/// quota has fully replenished are dropped once the map reaches `sweep_at`.
pub struct LoginThrottle {
    limiter: DefaultKeyedRateLimiter<String>,
    sweep_at: usize,
}

impl LoginThrottle {
    pub fn new(per_minute: NonZeroU32, sweep_at: usize) -> Self {
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            sweep_at,
        }
    }

    /// Records an attempt for `login_name`; `false` means over quota.
    pub fn check(&self, login_name: &str) -> bool {
        if self.limiter.len() >= self.sweep_at {
            let before = self.limiter.len();
            self.limiter.retain_recent();
            self.limiter.shrink_to_fit();
            debug!(
                "Swept login throttle: {} -> {} names",
                before,
                self.limiter.len()
            );
        }

        self.limiter.check_key(&login_name.to_string()).is_ok()
    }

    /// Login names currently tracked.
    pub fn tracked(&self) -> usize {
        self.limiter.len()
    }
}
