//! Community repository
//!
//! Graph-store operations for the community entity kind and the
//! user→community follow edges.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Community, User};

use super::uow::run_in_transaction;
use super::StoreError;

/// Store operations for communities.
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// Look up a community by external id. A miss surfaces as
    /// [`StoreError::CommunityNotFound`].
    async fn find_by_external_id(&self, external_id: &str) -> Result<Community, StoreError>;

    /// Insert a community row and return it with its assigned internal
    /// id. When the external id is already present, including via a
    /// concurrent duplicate insert, the existing row is returned instead.
    async fn create(&self, external_id: &str) -> Result<Community, StoreError>;

    /// Rename a community's external id.
    async fn update(&self, community: &Community, new_external_id: &str)
        -> Result<(), StoreError>;

    /// Remove a community row and its edges.
    async fn delete(&self, community: &Community) -> Result<(), StoreError>;

    /// Insert the follow edge if absent; an existing edge is a no-op.
    async fn follow(&self, community: &Community, follower: &User) -> Result<(), StoreError>;

    /// Delete the follow edge if present; an absent edge is a no-op.
    async fn unfollow(&self, community: &Community, follower: &User) -> Result<(), StoreError>;

    async fn is_following(&self, community: &Community, follower: &User)
        -> Result<bool, StoreError>;

    /// Users following `community`. Empty when nobody does.
    async fn followers_of(&self, community: &Community) -> Result<Vec<User>, StoreError>;
}

/// Postgres-backed [`CommunityRepository`].
#[derive(Debug, Clone)]
pub struct PgCommunityRepository {
    pool: PgPool,
}

impl PgCommunityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommunityRepository for PgCommunityRepository {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Community, StoreError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, external_id FROM communities WHERE external_id = $1")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((id, external_id)) => Ok(Community { id, external_id }),
            None => Err(StoreError::CommunityNotFound(external_id.to_string())),
        }
    }

    async fn create(&self, external_id: &str) -> Result<Community, StoreError> {
        // The closure's future may borrow only the transaction handle, so
        // everything else moves in as owned values.
        let external_id = external_id.to_owned();
        run_in_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                // The unique constraint on external_id resolves concurrent
                // duplicate inserts; the loser falls through to the
                // existing row.
                let row: Option<(i64, String)> = sqlx::query_as(
                    "INSERT INTO communities (external_id) VALUES ($1) \
                     ON CONFLICT (external_id) DO NOTHING RETURNING id, external_id",
                )
                .bind(&external_id)
                .fetch_optional(&mut **tx)
                .await?;

                let (id, external_id) = match row {
                    Some(row) => row,
                    None => {
                        sqlx::query_as(
                            "SELECT id, external_id FROM communities WHERE external_id = $1",
                        )
                        .bind(&external_id)
                        .fetch_one(&mut **tx)
                        .await?
                    }
                };

                Ok(Community { id, external_id })
            })
        })
        .await
    }

    async fn update(
        &self,
        community: &Community,
        new_external_id: &str,
    ) -> Result<(), StoreError> {
        let community_id = community.id;
        let new_external_id = new_external_id.to_owned();
        run_in_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                sqlx::query("UPDATE communities SET external_id = $1 WHERE id = $2")
                    .bind(new_external_id)
                    .bind(community_id)
                    .execute(&mut **tx)
                    .await?;

                Ok(())
            })
        })
        .await
    }

    async fn delete(&self, community: &Community) -> Result<(), StoreError> {
        let community_id = community.id;
        run_in_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                sqlx::query("DELETE FROM communities WHERE id = $1")
                    .bind(community_id)
                    .execute(&mut **tx)
                    .await?;

                Ok(())
            })
        })
        .await
    }

    async fn follow(&self, community: &Community, follower: &User) -> Result<(), StoreError> {
        let follower_id = follower.id;
        let community_id = community.id;
        run_in_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                // Same uniqueness-constraint safety as the user edge.
                sqlx::query(
                    "INSERT INTO communities_followers (follower_id, community_id) \
                     VALUES ($1, $2) ON CONFLICT (follower_id, community_id) DO NOTHING",
                )
                .bind(follower_id)
                .bind(community_id)
                .execute(&mut **tx)
                .await?;

                Ok(())
            })
        })
        .await
    }

    async fn unfollow(&self, community: &Community, follower: &User) -> Result<(), StoreError> {
        let follower_id = follower.id;
        let community_id = community.id;
        run_in_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                sqlx::query(
                    "DELETE FROM communities_followers \
                     WHERE follower_id = $1 AND community_id = $2",
                )
                .bind(follower_id)
                .bind(community_id)
                .execute(&mut **tx)
                .await?;

                Ok(())
            })
        })
        .await
    }

    async fn is_following(
        &self,
        community: &Community,
        follower: &User,
    ) -> Result<bool, StoreError> {
        let row: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM communities_followers WHERE follower_id = $1 AND community_id = $2",
        )
        .bind(follower.id)
        .bind(community.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn followers_of(&self, community: &Community) -> Result<Vec<User>, StoreError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT u.id, u.external_id FROM users u \
             JOIN communities_followers cf ON cf.follower_id = u.id \
             WHERE cf.community_id = $1",
        )
        .bind(community.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, external_id)| User { id, external_id })
            .collect())
    }
}
