//! Wire payloads
//!
//! JSON bodies published to and consumed from the broker, one topic per
//! event kind. Only external ids cross this boundary.

use serde::{Deserialize, Serialize};

pub const USER_CREATED_TOPIC: &str = "user-created";
pub const COMMUNITY_CREATED_TOPIC: &str = "community-created";
pub const USER_FOLLOWED_TOPIC: &str = "user-followed";
pub const USER_UNFOLLOWED_TOPIC: &str = "user-unfollowed";
pub const COMMUNITY_FOLLOWED_TOPIC: &str = "community-followed";
pub const COMMUNITY_UNFOLLOWED_TOPIC: &str = "community-unfollowed";

/// Published on `user-followed` after the edge commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFollowedEvent {
    pub followee_id: String,
    pub follower_id: String,
}

/// Published on `user-unfollowed` after the edge is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUnfollowedEvent {
    pub followee_id: String,
    pub follower_id: String,
}

/// Published on `community-followed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityFollowedEvent {
    pub community_id: String,
    pub user_id: String,
}

/// Published on `community-unfollowed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityUnfollowedEvent {
    pub community_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    pub external_id: String,
}

/// Consumed from `user-created`, emitted by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedEvent {
    pub user: UserMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityMessage {
    pub external_id: String,
}

/// Consumed from `community-created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityCreatedEvent {
    pub community: CommunityMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_event_wire_shape() {
        let event = UserFollowedEvent {
            followee_id: "10".to_string(),
            follower_id: "20".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"followee_id": "10", "follower_id": "20"})
        );
    }

    #[test]
    fn test_community_event_wire_shape() {
        let event = CommunityFollowedEvent {
            community_id: "5".to_string(),
            user_id: "7".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"community_id": "5", "user_id": "7"}));
    }

    #[test]
    fn test_created_event_nests_entity_key() {
        let event: UserCreatedEvent =
            serde_json::from_str(r#"{"user": {"external_id": "abc"}}"#).unwrap();
        assert_eq!(event.user.external_id, "abc");

        let event: CommunityCreatedEvent =
            serde_json::from_str(r#"{"community": {"external_id": "xyz"}}"#).unwrap();
        assert_eq!(event.community.external_id, "xyz");
    }
}
