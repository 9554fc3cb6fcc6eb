//! Event production and consumption
//!
//! The broker boundary: producers publish to one topic each, consumers
//! run one cancellable read loop each. The rest of the crate depends only
//! on the [`Producer`], [`MessageReader`] and [`EventHandler`] traits.

pub mod consumer;
pub mod handlers;
pub mod messages;
pub mod producer;

pub use consumer::{Consumer, MessageReader, ReaderError, RedisReader};
pub use handlers::{CommunityCreatedHandler, EventHandler, UserCreatedHandler};
pub use producer::{MemoryProducer, Producer, ProducerError, RedisProducer};
