use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::auth::SessionContext;
use crate::error::{AppError, AppResult};
use crate::models::profile::{ProfileUpdateInput, UserProfile};
use crate::store::repositories::profile_repository::ProfileRepository;
use crate::store::DocumentStore;

pub const DEFAULT_WEEKLY_TARGET_POINTS: i64 = 100;

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create-or-refresh the profile at the login boundary. Identity fields
    /// follow the auth provider; the weekly target survives re-login.
    pub async fn ensure_profile(
        &self,
        session: &SessionContext,
        nickname: &str,
        email: &str,
    ) -> AppResult<UserProfile> {
        match ProfileRepository::find(self.store.as_ref(), session.user_id()).await? {
            Some(existing) => {
                if existing.nickname == nickname && existing.email == email {
                    debug!(target: "app::profile", user_id = %session.user_id(), "profile up to date");
                    return Ok(existing);
                }
                let refreshed = UserProfile {
                    nickname: nickname.to_string(),
                    email: email.to_string(),
                    ..existing
                };
                ProfileRepository::update(self.store.as_ref(), &refreshed).await?;
                info!(target: "app::profile", user_id = %session.user_id(), "profile refreshed");
                Ok(refreshed)
            }
            None => {
                let fresh = UserProfile {
                    id: String::new(),
                    user_id: session.user_id().to_string(),
                    nickname: nickname.to_string(),
                    email: email.to_string(),
                    weekly_target_points: DEFAULT_WEEKLY_TARGET_POINTS,
                    created_at: Utc::now(),
                };
                let created = ProfileRepository::insert(self.store.as_ref(), &fresh).await?;
                info!(target: "app::profile", user_id = %session.user_id(), "profile created");
                Ok(created)
            }
        }
    }

    pub async fn get_profile(&self, session: &SessionContext) -> AppResult<UserProfile> {
        ProfileRepository::find(self.store.as_ref(), session.user_id())
            .await?
            .ok_or_else(AppError::not_found)
    }

    pub async fn update_profile(
        &self,
        session: &SessionContext,
        update: ProfileUpdateInput,
    ) -> AppResult<UserProfile> {
        let mut profile = self.get_profile(session).await?;

        if let Some(nickname) = update.nickname {
            let trimmed = nickname.trim();
            if trimmed.is_empty() {
                return Err(AppError::validation("nickname must not be empty"));
            }
            profile.nickname = trimmed.to_string();
        }

        if let Some(target) = update.weekly_target_points {
            if target <= 0 {
                return Err(AppError::validation(
                    "weekly target must be a positive number of points",
                ));
            }
            profile.weekly_target_points = target;
        }

        ProfileRepository::update(self.store.as_ref(), &profile).await?;
        info!(target: "app::profile", user_id = %session.user_id(), "profile updated");
        Ok(profile)
    }
}
