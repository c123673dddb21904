use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::email::Mailer;
use crate::rate_limit::AttemptLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub login_limiter: AttemptLimiter,
    pub reset_limiter: AttemptLimiter,
}

impl AppState {
    pub fn new(db: Database, config: Config, mailer: Option<Arc<dyn Mailer>>) -> Self {
        Self {
            db,
            config,
            mailer,
            login_limiter: AttemptLimiter::login(),
            reset_limiter: AttemptLimiter::password_reset(),
        }
    }
}
