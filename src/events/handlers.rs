//! Inbound event handlers
//!
//! Apply "created" events from other services to the local projection of
//! users and communities. Application is idempotent, so broker redelivery
//! of the same event is harmless.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;
use crate::service::{CommunityService, UserService};

use super::messages::{CommunityCreatedEvent, UserCreatedEvent};

/// Handles one decoded payload from a consumer's read loop.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, payload: &[u8]) -> Result<(), AppError>;
}

/// Applies `user-created` events.
pub struct UserCreatedHandler {
    service: Arc<UserService>,
}

impl UserCreatedHandler {
    pub fn new(service: Arc<UserService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for UserCreatedHandler {
    async fn handle(&self, payload: &[u8]) -> Result<(), AppError> {
        let event: UserCreatedEvent = serde_json::from_slice(payload)?;
        self.service.create_user(&event.user.external_id).await?;
        Ok(())
    }
}

/// Applies `community-created` events.
pub struct CommunityCreatedHandler {
    service: Arc<CommunityService>,
}

impl CommunityCreatedHandler {
    pub fn new(service: Arc<CommunityService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for CommunityCreatedHandler {
    async fn handle(&self, payload: &[u8]) -> Result<(), AppError> {
        let event: CommunityCreatedEvent = serde_json::from_slice(payload)?;
        self.service
            .create_community(&event.community.external_id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::events::MemoryProducer;
    use crate::store::Store;

    use super::*;

    fn user_handler() -> (UserCreatedHandler, Store) {
        let store = Store::in_memory();
        let service = Arc::new(UserService::new(
            Arc::clone(&store.users),
            Arc::new(MemoryProducer::new()),
            Arc::new(MemoryProducer::new()),
        ));
        (UserCreatedHandler::new(service), store)
    }

    #[tokio::test]
    async fn test_user_created_event_applies_upsert() {
        let (handler, store) = user_handler();

        let payload = br#"{"user": {"external_id": "u-1"}}"#;
        handler.handle(payload).await.unwrap();
        // Redelivery hits the already-present branch.
        handler.handle(payload).await.unwrap();

        let user = store.users.find_by_external_id("u-1").await.unwrap();
        assert_eq!(user.external_id, "u-1");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_handler_error() {
        let (handler, _store) = user_handler();

        let err = handler.handle(b"not json").await.unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_community_created_event_applies_upsert() {
        let store = Store::in_memory();
        let service = Arc::new(CommunityService::new(
            Arc::clone(&store.communities),
            Arc::new(MemoryProducer::new()),
            Arc::new(MemoryProducer::new()),
        ));
        let handler = CommunityCreatedHandler::new(service);

        handler
            .handle(br#"{"community": {"external_id": "c-1"}}"#)
            .await
            .unwrap();

        let community = store
            .communities
            .find_by_external_id("c-1")
            .await
            .unwrap();
        assert_eq!(community.external_id, "c-1");
    }
}
