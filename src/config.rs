use std::env;
use std::time::Duration as StdDuration;

use chrono_tz::Tz;

use crate::error::{AppError, AppResult};
use crate::store::firestore::FirestoreConfig;

const TIMEZONE_VAR: &str = "PIZZA_TIMEZONE";
const HTTP_TIMEOUT_VAR: &str = "PIZZA_HTTP_TIMEOUT_SECS";
const PROJECT_ID_VAR: &str = "FIRESTORE_PROJECT_ID";
const API_KEY_VAR: &str = "FIRESTORE_API_KEY";
const EMULATOR_URL_VAR: &str = "FIRESTORE_EMULATOR_URL";

/// Runtime configuration read from the environment. The timezone drives what
/// "local midnight" means for day and week boundaries; the Firestore section
/// is absent when no hosted backend is configured.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub timezone: Tz,
    pub firestore: Option<FirestoreConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            firestore: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        let timezone = match env::var(TIMEZONE_VAR) {
            Ok(raw) => raw
                .parse::<Tz>()
                .map_err(|_| AppError::config(format!("unknown timezone in {TIMEZONE_VAR}: {raw}")))?,
            Err(_) => Tz::UTC,
        };

        let firestore = match env::var(PROJECT_ID_VAR) {
            Ok(project_id) => {
                let mut config = FirestoreConfig::new(project_id);
                config.api_key = env::var(API_KEY_VAR).ok();
                config.base_url = env::var(EMULATOR_URL_VAR).ok();
                if let Ok(raw) = env::var(HTTP_TIMEOUT_VAR) {
                    let seconds = raw.parse::<u64>().map_err(|_| {
                        AppError::config(format!("invalid {HTTP_TIMEOUT_VAR}: {raw}"))
                    })?;
                    config.http_timeout = StdDuration::from_secs(seconds);
                }
                Some(config)
            }
            Err(_) => None,
        };

        Ok(Self {
            timezone,
            firestore,
        })
    }
}
