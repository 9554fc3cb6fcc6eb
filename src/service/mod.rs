//! Relationship services
//!
//! Orchestrate graph-store mutations with event publication and absorb
//! inbound "created" events idempotently. Services never touch rows
//! directly; every mutation goes through a repository.

mod community_service;
mod user_service;

pub use community_service::CommunityService;
pub use user_service::UserService;
