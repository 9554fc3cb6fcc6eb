//! Event producers
//!
//! One producer instance per outbound topic. Publishing is synchronous
//! at-least-once: the call returns once the broker acknowledged the write
//! or the write failed, and no retry or backoff happens here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Producer failure modes.
#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error("broker write failed: {0}")]
    Broker(#[from] redis::RedisError),

    #[error("producer is stopped")]
    Stopped,
}

/// Publishes byte payloads to a single named topic.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Send one payload, blocking the caller until the broker
    /// acknowledges it. Safe for concurrent calls.
    async fn publish(&self, payload: Vec<u8>) -> Result<(), ProducerError>;

    /// Mark the producer stopped; publishes after `stop` fail with
    /// [`ProducerError::Stopped`]. There is nothing to flush: every
    /// publish is acknowledged before it returns, and the broker
    /// connection is shared, owned by the process and closed at shutdown.
    async fn stop(&self) -> Result<(), ProducerError>;
}

/// Redis pub/sub backed [`Producer`].
pub struct RedisProducer {
    topic: String,
    conn: ConnectionManager,
    stopped: AtomicBool,
}

impl RedisProducer {
    pub fn new(conn: ConnectionManager, topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            conn,
            stopped: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Producer for RedisProducer {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), ProducerError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(ProducerError::Stopped);
        }

        // ConnectionManager multiplexes internally; each call takes its
        // own cloned handle.
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(&self.topic, payload).await?;

        tracing::debug!(topic = %self.topic, "event published");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ProducerError> {
        self.stopped.store(true, Ordering::Release);
        tracing::info!(topic = %self.topic, "producer stopped");
        Ok(())
    }
}

/// In-process [`Producer`] that records every acknowledged payload.
///
/// Used by the unit and router tests; [`MemoryProducer::fail_next_publish`]
/// arms a single broker-style failure to exercise the dual-write gap.
#[derive(Debug, Default)]
pub struct MemoryProducer {
    published: Mutex<Vec<Vec<u8>>>,
    fail_next: AtomicBool,
    stopped: AtomicBool,
}

impl MemoryProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `publish` fail as if the broker write failed.
    pub fn fail_next_publish(&self) {
        self.fail_next.store(true, Ordering::Release);
    }

    /// Every payload acknowledged so far.
    pub fn published(&self) -> Vec<Vec<u8>> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Producer for MemoryProducer {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), ProducerError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(ProducerError::Stopped);
        }

        if self.fail_next.swap(false, Ordering::AcqRel) {
            return Err(ProducerError::Broker(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "simulated broker write failure",
            ))));
        }

        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ProducerError> {
        self.stopped.store(true, Ordering::Release);
        Ok(())
    }
}
