use crate::error::AppResult;
use crate::models::profile::UserProfile;
use crate::store::{collections, DocumentRef, DocumentStore, Filter};

use super::{decode_record, encode_record};

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn find(
        store: &dyn DocumentStore,
        user_id: &str,
    ) -> AppResult<Option<UserProfile>> {
        let documents = store
            .query(collections::USERS, &[Filter::eq("userId", user_id)])
            .await?;
        documents.into_iter().next().map(decode_record).transpose()
    }

    pub async fn insert(
        store: &dyn DocumentStore,
        profile: &UserProfile,
    ) -> AppResult<UserProfile> {
        let document = store
            .insert(collections::USERS, encode_record(profile)?)
            .await?;
        let mut created = profile.clone();
        created.id = document.id;
        Ok(created)
    }

    pub async fn update(store: &dyn DocumentStore, profile: &UserProfile) -> AppResult<()> {
        store
            .update(
                &DocumentRef::new(collections::USERS, &profile.id),
                encode_record(profile)?,
            )
            .await
    }
}
