//! User repository
//!
//! Graph-store operations for the user entity kind and the user→user
//! follow edges.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Community, User};

use super::uow::run_in_transaction;
use super::StoreError;

/// Store operations for users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by external id. A miss surfaces as
    /// [`StoreError::UserNotFound`].
    async fn find_by_external_id(&self, external_id: &str) -> Result<User, StoreError>;

    /// Insert a user row and return it with its assigned internal id.
    /// When the external id is already present, including via a concurrent
    /// duplicate insert, the existing row is returned instead.
    async fn create(&self, external_id: &str) -> Result<User, StoreError>;

    /// Rename a user's external id.
    async fn update(&self, user: &User, new_external_id: &str) -> Result<(), StoreError>;

    /// Remove a user row and its edges.
    async fn delete(&self, user: &User) -> Result<(), StoreError>;

    /// Insert the follow edge if absent. Inserting an edge that already
    /// exists, including via a concurrent duplicate call, is a successful
    /// no-op.
    async fn follow(&self, follower: &User, followee: &User) -> Result<(), StoreError>;

    /// Delete the follow edge if present; an absent edge is a no-op.
    async fn unfollow(&self, follower: &User, followee: &User) -> Result<(), StoreError>;

    async fn is_following(&self, follower: &User, followee: &User) -> Result<bool, StoreError>;

    /// Users following `user`. Empty when nobody does; never an error.
    async fn followers_of(&self, user: &User) -> Result<Vec<User>, StoreError>;

    /// Users that `user` follows.
    async fn followees_of(&self, user: &User) -> Result<Vec<User>, StoreError>;

    /// Communities that `user` follows.
    async fn communities_of(&self, user: &User) -> Result<Vec<Community>, StoreError>;
}

/// Postgres-backed [`UserRepository`].
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_external_id(&self, external_id: &str) -> Result<User, StoreError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, external_id FROM users WHERE external_id = $1")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((id, external_id)) => Ok(User { id, external_id }),
            None => Err(StoreError::UserNotFound(external_id.to_string())),
        }
    }

    async fn create(&self, external_id: &str) -> Result<User, StoreError> {
        // The closure's future may borrow only the transaction handle, so
        // everything else moves in as owned values.
        let external_id = external_id.to_owned();
        run_in_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                // The unique constraint on external_id resolves concurrent
                // duplicate inserts; the loser falls through to the
                // existing row.
                let row: Option<(i64, String)> = sqlx::query_as(
                    "INSERT INTO users (external_id) VALUES ($1) \
                     ON CONFLICT (external_id) DO NOTHING RETURNING id, external_id",
                )
                .bind(&external_id)
                .fetch_optional(&mut **tx)
                .await?;

                let (id, external_id) = match row {
                    Some(row) => row,
                    None => {
                        sqlx::query_as(
                            "SELECT id, external_id FROM users WHERE external_id = $1",
                        )
                        .bind(&external_id)
                        .fetch_one(&mut **tx)
                        .await?
                    }
                };

                Ok(User { id, external_id })
            })
        })
        .await
    }

    async fn update(&self, user: &User, new_external_id: &str) -> Result<(), StoreError> {
        let user_id = user.id;
        let new_external_id = new_external_id.to_owned();
        run_in_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                sqlx::query("UPDATE users SET external_id = $1 WHERE id = $2")
                    .bind(new_external_id)
                    .bind(user_id)
                    .execute(&mut **tx)
                    .await?;

                Ok(())
            })
        })
        .await
    }

    async fn delete(&self, user: &User) -> Result<(), StoreError> {
        let user_id = user.id;
        run_in_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(user_id)
                    .execute(&mut **tx)
                    .await?;

                Ok(())
            })
        })
        .await
    }

    async fn follow(&self, follower: &User, followee: &User) -> Result<(), StoreError> {
        let follower_id = follower.id;
        let followee_id = followee.id;
        run_in_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                // The unique constraint on (follower_id, followee_id) is
                // the safety mechanism under concurrent duplicate calls;
                // ON CONFLICT folds the violation into the idempotent
                // already-followed outcome.
                sqlx::query(
                    "INSERT INTO users_followers (follower_id, followee_id) VALUES ($1, $2) \
                     ON CONFLICT (follower_id, followee_id) DO NOTHING",
                )
                .bind(follower_id)
                .bind(followee_id)
                .execute(&mut **tx)
                .await?;

                Ok(())
            })
        })
        .await
    }

    async fn unfollow(&self, follower: &User, followee: &User) -> Result<(), StoreError> {
        let follower_id = follower.id;
        let followee_id = followee.id;
        run_in_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                // Zero rows affected means the edge was already absent.
                sqlx::query(
                    "DELETE FROM users_followers WHERE follower_id = $1 AND followee_id = $2",
                )
                .bind(follower_id)
                .bind(followee_id)
                .execute(&mut **tx)
                .await?;

                Ok(())
            })
        })
        .await
    }

    async fn is_following(&self, follower: &User, followee: &User) -> Result<bool, StoreError> {
        let row: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM users_followers WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(follower.id)
        .bind(followee.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn followers_of(&self, user: &User) -> Result<Vec<User>, StoreError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT u.id, u.external_id FROM users u \
             JOIN users_followers uf ON uf.follower_id = u.id \
             WHERE uf.followee_id = $1",
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, external_id)| User { id, external_id })
            .collect())
    }

    async fn followees_of(&self, user: &User) -> Result<Vec<User>, StoreError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT u.id, u.external_id FROM users u \
             JOIN users_followers uf ON uf.followee_id = u.id \
             WHERE uf.follower_id = $1",
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, external_id)| User { id, external_id })
            .collect())
    }

    async fn communities_of(&self, user: &User) -> Result<Vec<Community>, StoreError> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT c.id, c.external_id FROM communities c \
             JOIN communities_followers cf ON cf.community_id = c.id \
             WHERE cf.follower_id = $1",
        )
        .bind(user.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, external_id)| Community { id, external_id })
            .collect())
    }
}
