//! In-memory repositories
//!
//! Hash-map backed implementations of the repository traits. They back the
//! unit and router tests and double as a storage layer for local runs
//! without Postgres. Both repositories share one graph so user→community
//! queries see the same edges from either side.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::{Community, User};

use super::{CommunityRepository, StoreError, UserRepository};

#[derive(Debug, Default)]
struct GraphState {
    next_user_id: i64,
    next_community_id: i64,
    users: Vec<User>,
    communities: Vec<Community>,
    // (follower internal id, followee internal id)
    user_edges: HashSet<(i64, i64)>,
    // (follower internal id, community internal id)
    community_edges: HashSet<(i64, i64)>,
}

/// Shared in-memory follow graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    state: Arc<Mutex<GraphState>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> MemoryUserRepository {
        MemoryUserRepository {
            state: Arc::clone(&self.state),
        }
    }

    pub fn communities(&self) -> MemoryCommunityRepository {
        MemoryCommunityRepository {
            state: Arc::clone(&self.state),
        }
    }
}

fn lock(state: &Mutex<GraphState>) -> std::sync::MutexGuard<'_, GraphState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`UserRepository`] over a [`MemoryGraph`].
#[derive(Debug, Clone)]
pub struct MemoryUserRepository {
    state: Arc<Mutex<GraphState>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_external_id(&self, external_id: &str) -> Result<User, StoreError> {
        lock(&self.state)
            .users
            .iter()
            .find(|u| u.external_id == external_id)
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(external_id.to_string()))
    }

    async fn create(&self, external_id: &str) -> Result<User, StoreError> {
        let mut state = lock(&self.state);
        // Mirrors the unique constraint on external_id: a duplicate
        // create returns the existing row.
        if let Some(existing) = state.users.iter().find(|u| u.external_id == external_id) {
            return Ok(existing.clone());
        }
        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            external_id: external_id.to_string(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User, new_external_id: &str) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        if let Some(stored) = state.users.iter_mut().find(|u| u.id == user.id) {
            stored.external_id = new_external_id.to_string();
        }
        Ok(())
    }

    async fn delete(&self, user: &User) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        state.users.retain(|u| u.id != user.id);
        state
            .user_edges
            .retain(|&(follower, followee)| follower != user.id && followee != user.id);
        state
            .community_edges
            .retain(|&(follower, _)| follower != user.id);
        Ok(())
    }

    async fn follow(&self, follower: &User, followee: &User) -> Result<(), StoreError> {
        // HashSet insert mirrors the unique constraint: a duplicate edge
        // is silently absorbed.
        lock(&self.state).user_edges.insert((follower.id, followee.id));
        Ok(())
    }

    async fn unfollow(&self, follower: &User, followee: &User) -> Result<(), StoreError> {
        lock(&self.state).user_edges.remove(&(follower.id, followee.id));
        Ok(())
    }

    async fn is_following(&self, follower: &User, followee: &User) -> Result<bool, StoreError> {
        Ok(lock(&self.state)
            .user_edges
            .contains(&(follower.id, followee.id)))
    }

    async fn followers_of(&self, user: &User) -> Result<Vec<User>, StoreError> {
        let state = lock(&self.state);
        Ok(state
            .users
            .iter()
            .filter(|u| state.user_edges.contains(&(u.id, user.id)))
            .cloned()
            .collect())
    }

    async fn followees_of(&self, user: &User) -> Result<Vec<User>, StoreError> {
        let state = lock(&self.state);
        Ok(state
            .users
            .iter()
            .filter(|u| state.user_edges.contains(&(user.id, u.id)))
            .cloned()
            .collect())
    }

    async fn communities_of(&self, user: &User) -> Result<Vec<Community>, StoreError> {
        let state = lock(&self.state);
        Ok(state
            .communities
            .iter()
            .filter(|c| state.community_edges.contains(&(user.id, c.id)))
            .cloned()
            .collect())
    }
}

/// [`CommunityRepository`] over a [`MemoryGraph`].
#[derive(Debug, Clone)]
pub struct MemoryCommunityRepository {
    state: Arc<Mutex<GraphState>>,
}

#[async_trait]
impl CommunityRepository for MemoryCommunityRepository {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Community, StoreError> {
        lock(&self.state)
            .communities
            .iter()
            .find(|c| c.external_id == external_id)
            .cloned()
            .ok_or_else(|| StoreError::CommunityNotFound(external_id.to_string()))
    }

    async fn create(&self, external_id: &str) -> Result<Community, StoreError> {
        let mut state = lock(&self.state);
        if let Some(existing) = state
            .communities
            .iter()
            .find(|c| c.external_id == external_id)
        {
            return Ok(existing.clone());
        }
        state.next_community_id += 1;
        let community = Community {
            id: state.next_community_id,
            external_id: external_id.to_string(),
        };
        state.communities.push(community.clone());
        Ok(community)
    }

    async fn update(
        &self,
        community: &Community,
        new_external_id: &str,
    ) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        if let Some(stored) = state.communities.iter_mut().find(|c| c.id == community.id) {
            stored.external_id = new_external_id.to_string();
        }
        Ok(())
    }

    async fn delete(&self, community: &Community) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        state.communities.retain(|c| c.id != community.id);
        state
            .community_edges
            .retain(|&(_, followed)| followed != community.id);
        Ok(())
    }

    async fn follow(&self, community: &Community, follower: &User) -> Result<(), StoreError> {
        lock(&self.state)
            .community_edges
            .insert((follower.id, community.id));
        Ok(())
    }

    async fn unfollow(&self, community: &Community, follower: &User) -> Result<(), StoreError> {
        lock(&self.state)
            .community_edges
            .remove(&(follower.id, community.id));
        Ok(())
    }

    async fn is_following(
        &self,
        community: &Community,
        follower: &User,
    ) -> Result<bool, StoreError> {
        Ok(lock(&self.state)
            .community_edges
            .contains(&(follower.id, community.id)))
    }

    async fn followers_of(&self, community: &Community) -> Result<Vec<User>, StoreError> {
        let state = lock(&self.state);
        Ok(state
            .users
            .iter()
            .filter(|u| state.community_edges.contains(&(u.id, community.id)))
            .cloned()
            .collect())
    }
}
