use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::domain::{Community, User};
use crate::error::AppError;
use crate::service::{CommunityService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub communities: Arc<CommunityService>,
}

#[derive(Debug, Serialize)]
struct EntityResponse {
    external_id: String,
}

impl From<User> for EntityResponse {
    fn from(user: User) -> Self {
        Self {
            external_id: user.external_id,
        }
    }
}

impl From<Community> for EntityResponse {
    fn from(community: Community) -> Self {
        Self {
            external_id: community.external_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct FollowersResponse {
    followers: Vec<EntityResponse>,
}

#[derive(Debug, Serialize)]
struct CommunitiesResponse {
    communities: Vec<EntityResponse>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/users/:user_id/followers", get(get_user_followers))
        .route(
            "/api/users/:user_id/followers/:follower_id",
            post(follow_user).delete(unfollow_user),
        )
        .route("/api/users/:user_id/communities", get(get_user_communities))
        .route(
            "/api/communities/:community_id/followers",
            get(get_community_followers),
        )
        .route(
            "/api/communities/:community_id/followers/:user_id",
            post(follow_community).delete(unfollow_community),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /api/users/{user_id}/followers/{follower_id}
///
/// The user named by `follower_id` starts following the user named by
/// `user_id`. Safe to repeat.
async fn follow_user(
    State(state): State<AppState>,
    Path((user_id, follower_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let followee = state.users.get_user(&user_id).await?;
    let follower = state.users.get_user(&follower_id).await?;
    state.users.follow_user(&follower, &followee).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/users/{user_id}/followers/{follower_id}
async fn unfollow_user(
    State(state): State<AppState>,
    Path((user_id, follower_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let followee = state.users.get_user(&user_id).await?;
    let follower = state.users.get_user(&follower_id).await?;
    state.users.unfollow_user(&follower, &followee).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_user_followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<FollowersResponse>, AppError> {
    let user = state.users.get_user(&user_id).await?;
    let followers = state.users.get_user_followers(&user).await?;
    Ok(Json(FollowersResponse {
        followers: followers.into_iter().map(EntityResponse::from).collect(),
    }))
}

async fn get_user_communities(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<CommunitiesResponse>, AppError> {
    let user = state.users.get_user(&user_id).await?;
    let communities = state.users.get_user_communities(&user).await?;
    Ok(Json(CommunitiesResponse {
        communities: communities.into_iter().map(EntityResponse::from).collect(),
    }))
}

async fn follow_community(
    State(state): State<AppState>,
    Path((community_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let community = state.communities.get_community(&community_id).await?;
    let user = state.users.get_user(&user_id).await?;
    state.communities.follow_community(&community, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unfollow_community(
    State(state): State<AppState>,
    Path((community_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let community = state.communities.get_community(&community_id).await?;
    let user = state.users.get_user(&user_id).await?;
    state
        .communities
        .unfollow_community(&community, &user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_community_followers(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> Result<Json<FollowersResponse>, AppError> {
    let community = state.communities.get_community(&community_id).await?;
    let followers = state.communities.get_community_followers(&community).await?;
    Ok(Json(FollowersResponse {
        followers: followers.into_iter().map(EntityResponse::from).collect(),
    }))
}
