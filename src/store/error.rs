//! Store error types

/// Errors surfaced by the graph store.
///
/// Lookup misses get their own variants so callers can tell "no such
/// entity" apart from a transport failure; everything else propagates as
/// [`StoreError::Database`] unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("community not found: {0}")]
    CommunityNotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// True for the lookup-miss variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::UserNotFound(_) | StoreError::CommunityNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(StoreError::UserNotFound("1".into()).is_not_found());
        assert!(StoreError::CommunityNotFound("1".into()).is_not_found());
        assert!(!StoreError::Database(sqlx::Error::PoolClosed).is_not_found());
    }
}
