//! Domain entities
//!
//! The two entity kinds tracked by the follow graph. Internal ids are
//! store-assigned and never cross the service boundary; external ids are
//! assigned by upstream services and are the only identifiers exposed.

/// A user known to this service.
///
/// `id` is the store-local key. `external_id` is the globally-unique
/// identifier assigned by the upstream identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub external_id: String,
}

/// A community known to this service. Structurally identical to [`User`];
/// only the follow-edge tables differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Community {
    pub id: i64,
    pub external_id: String,
}
