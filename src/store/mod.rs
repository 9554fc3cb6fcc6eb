//! Graph store
//!
//! Repositories for the two entity kinds and their follow edges, plus the
//! unit of work their mutations run through. The store exclusively owns
//! all persisted rows; services mutate only through these operations.

mod community_repository;
mod error;
pub mod memory;
pub mod uow;
mod user_repository;

use std::sync::Arc;

use sqlx::PgPool;

pub use community_repository::{CommunityRepository, PgCommunityRepository};
pub use error::StoreError;
pub use user_repository::{PgUserRepository, UserRepository};

/// Aggregate of every repository, accessed through explicit named fields.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub communities: Arc<dyn CommunityRepository>,
}

impl Store {
    /// Postgres-backed store over a shared pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            communities: Arc::new(PgCommunityRepository::new(pool)),
        }
    }

    /// In-memory store for tests and local runs.
    pub fn in_memory() -> Self {
        let graph = memory::MemoryGraph::new();
        Self {
            users: Arc::new(graph.users()),
            communities: Arc::new(graph.communities()),
        }
    }
}
