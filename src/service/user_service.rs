//! User relationship service
//!
//! Couples user graph mutations to event publication. The store mutation
//! commits in its own transaction first; the event publish is attempted
//! second, outside the transaction.

use std::sync::Arc;

use crate::domain::{Community, User};
use crate::error::AppError;
use crate::events::messages::{UserFollowedEvent, UserUnfollowedEvent};
use crate::events::Producer;
use crate::store::{StoreError, UserRepository};

/// Business logic for users and the user→user follow edges.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    user_followed: Arc<dyn Producer>,
    user_unfollowed: Arc<dyn Producer>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        user_followed: Arc<dyn Producer>,
        user_unfollowed: Arc<dyn Producer>,
    ) -> Self {
        Self {
            users,
            user_followed,
            user_unfollowed,
        }
    }

    pub async fn get_user(&self, external_id: &str) -> Result<User, AppError> {
        Ok(self.users.find_by_external_id(external_id).await?)
    }

    /// Idempotent upsert invoked by the `user-created` consumer: a
    /// redelivered event hits the already-present branch and succeeds
    /// silently. Concurrent duplicate deliveries that both miss the
    /// lookup resolve in the store, where the external_id unique
    /// constraint makes the losing insert return the existing row.
    pub async fn create_user(&self, external_id: &str) -> Result<User, AppError> {
        match self.users.find_by_external_id(external_id).await {
            Ok(existing) => Ok(existing),
            Err(StoreError::UserNotFound(_)) => Ok(self.users.create(external_id).await?),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn update_user(&self, user: &User, new_external_id: &str) -> Result<(), AppError> {
        Ok(self.users.update(user, new_external_id).await?)
    }

    pub async fn delete_user(&self, user: &User) -> Result<(), AppError> {
        Ok(self.users.delete(user).await?)
    }

    /// Persist the follow edge, then publish `user-followed`.
    ///
    /// A publish failure after the commit leaves the edge durable but the
    /// event lost — the dual-write gap. The error is returned so the
    /// caller can retry the whole operation; the idempotent edge insert
    /// makes the retry safe.
    pub async fn follow_user(&self, follower: &User, followee: &User) -> Result<(), AppError> {
        self.users.follow(follower, followee).await?;

        let payload = serde_json::to_vec(&UserFollowedEvent {
            followee_id: followee.external_id.clone(),
            follower_id: follower.external_id.clone(),
        })?;

        self.user_followed.publish(payload).await?;
        Ok(())
    }

    /// Remove the follow edge, then publish `user-unfollowed`. Same
    /// dual-write contract as [`follow_user`](Self::follow_user).
    pub async fn unfollow_user(&self, follower: &User, followee: &User) -> Result<(), AppError> {
        self.users.unfollow(follower, followee).await?;

        let payload = serde_json::to_vec(&UserUnfollowedEvent {
            followee_id: followee.external_id.clone(),
            follower_id: follower.external_id.clone(),
        })?;

        self.user_unfollowed.publish(payload).await?;
        Ok(())
    }

    pub async fn get_user_followers(&self, user: &User) -> Result<Vec<User>, AppError> {
        Ok(self.users.followers_of(user).await?)
    }

    pub async fn get_user_followees(&self, user: &User) -> Result<Vec<User>, AppError> {
        Ok(self.users.followees_of(user).await?)
    }

    pub async fn get_user_communities(&self, user: &User) -> Result<Vec<Community>, AppError> {
        Ok(self.users.communities_of(user).await?)
    }
}
