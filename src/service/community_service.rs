//! Community relationship service
//!
//! The community counterpart of [`UserService`](super::UserService):
//! store mutation first, event publish second.

use std::sync::Arc;

use crate::domain::{Community, User};
use crate::error::AppError;
use crate::events::messages::{CommunityFollowedEvent, CommunityUnfollowedEvent};
use crate::events::Producer;
use crate::store::{CommunityRepository, StoreError};

/// Business logic for communities and the user→community follow edges.
pub struct CommunityService {
    communities: Arc<dyn CommunityRepository>,
    community_followed: Arc<dyn Producer>,
    community_unfollowed: Arc<dyn Producer>,
}

impl CommunityService {
    pub fn new(
        communities: Arc<dyn CommunityRepository>,
        community_followed: Arc<dyn Producer>,
        community_unfollowed: Arc<dyn Producer>,
    ) -> Self {
        Self {
            communities,
            community_followed,
            community_unfollowed,
        }
    }

    pub async fn get_community(&self, external_id: &str) -> Result<Community, AppError> {
        Ok(self.communities.find_by_external_id(external_id).await?)
    }

    /// Idempotent upsert invoked by the `community-created` consumer.
    /// Same concurrency contract as `UserService::create_user`: the
    /// store resolves concurrent duplicate creates.
    pub async fn create_community(&self, external_id: &str) -> Result<Community, AppError> {
        match self.communities.find_by_external_id(external_id).await {
            Ok(existing) => Ok(existing),
            Err(StoreError::CommunityNotFound(_)) => {
                Ok(self.communities.create(external_id).await?)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Persist the follow edge, then publish `community-followed`. Same
    /// dual-write contract as the user service.
    pub async fn follow_community(
        &self,
        community: &Community,
        user: &User,
    ) -> Result<(), AppError> {
        self.communities.follow(community, user).await?;

        let payload = serde_json::to_vec(&CommunityFollowedEvent {
            community_id: community.external_id.clone(),
            user_id: user.external_id.clone(),
        })?;

        self.community_followed.publish(payload).await?;
        Ok(())
    }

    /// Remove the follow edge, then publish `community-unfollowed`.
    pub async fn unfollow_community(
        &self,
        community: &Community,
        user: &User,
    ) -> Result<(), AppError> {
        self.communities.unfollow(community, user).await?;

        let payload = serde_json::to_vec(&CommunityUnfollowedEvent {
            community_id: community.external_id.clone(),
            user_id: user.external_id.clone(),
        })?;

        self.community_unfollowed.publish(payload).await?;
        Ok(())
    }

    pub async fn get_community_followers(
        &self,
        community: &Community,
    ) -> Result<Vec<User>, AppError> {
        Ok(self.communities.followers_of(community).await?)
    }
}
