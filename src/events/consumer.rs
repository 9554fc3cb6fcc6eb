//! Event consumers
//!
//! One consumer per inbound topic, each owning a single background read
//! loop. The loop soft-fails: handler errors and transient broker errors
//! are logged and the loop keeps going, so one bad message or a broker
//! hiccup never tears down the subscription. A reader reporting
//! [`ReaderError::Closed`] is terminal; the loop exits instead of
//! spinning on a dead subscription.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::handlers::EventHandler;

/// Delay before re-polling a reader that just failed, so a persistently
/// erroring broker cannot pin a core or flood the logs.
const READ_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Reader failure modes.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("broker read failed: {0}")]
    Broker(#[from] redis::RedisError),

    #[error("subscription closed")]
    Closed,
}

/// Yields one byte payload per read from a single topic.
///
/// `read` is the consumer loop's sole suspension point; implementations
/// must stay cancel-safe there.
#[async_trait]
pub trait MessageReader: Send {
    async fn read(&mut self) -> Result<Vec<u8>, ReaderError>;

    /// Release the underlying subscription. Called exactly once, after
    /// the read loop exits.
    async fn close(&mut self);
}

/// Redis pub/sub backed [`MessageReader`].
pub struct RedisReader {
    topic: String,
    pubsub: redis::aio::PubSub,
}

impl RedisReader {
    /// Subscribe to `topic` on a dedicated connection.
    pub async fn subscribe(
        client: &redis::Client,
        topic: impl Into<String>,
    ) -> Result<Self, redis::RedisError> {
        let topic = topic.into();
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(&topic).await?;
        Ok(Self { topic, pubsub })
    }
}

#[async_trait]
impl MessageReader for RedisReader {
    async fn read(&mut self) -> Result<Vec<u8>, ReaderError> {
        match self.pubsub.on_message().next().await {
            Some(message) => Ok(message.get_payload()?),
            None => Err(ReaderError::Closed),
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.pubsub.unsubscribe(&self.topic).await {
            tracing::error!(topic = %self.topic, error = %err, "unsubscribe failed");
        }
    }
}

/// A cancellable read loop over one topic.
///
/// Lifecycle: created → running ([`start`](Consumer::start)) → stopping
/// ([`stop`](Consumer::stop)) → stopped once the loop observes the
/// cancellation and closes its reader.
pub struct Consumer<R: MessageReader + 'static> {
    topic: String,
    reader: Option<R>,
    handler: Arc<dyn EventHandler>,
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl<R: MessageReader + 'static> Consumer<R> {
    pub fn new(topic: impl Into<String>, reader: R, handler: Arc<dyn EventHandler>) -> Self {
        Self {
            topic: topic.into(),
            reader: Some(reader),
            handler,
            cancel: CancellationToken::new(),
            join: None,
        }
    }

    /// Spawn the read loop. Returns immediately; the loop runs until
    /// [`stop`](Consumer::stop). A second `start` is a logged no-op.
    pub fn start(&mut self) {
        let Some(mut reader) = self.reader.take() else {
            tracing::warn!(topic = %self.topic, "consumer already started");
            return;
        };

        let topic = self.topic.clone();
        let handler = Arc::clone(&self.handler);
        let cancel = self.cancel.clone();

        self.join = Some(tokio::spawn(async move {
            tracing::info!(topic = %topic, "consumer started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    message = reader.read() => match message {
                        Ok(payload) => {
                            if let Err(err) = handler.handle(&payload).await {
                                // The message still counts as consumed;
                                // there is no redelivery.
                                tracing::error!(
                                    topic = %topic,
                                    error = %err,
                                    "event handler failed",
                                );
                            }
                        }
                        Err(ReaderError::Closed) => {
                            tracing::error!(topic = %topic, "subscription closed, stopping consumer");
                            break;
                        }
                        Err(err) => {
                            tracing::error!(topic = %topic, error = %err, "read failed");
                            tokio::select! {
                                _ = cancel.cancelled() => break,
                                _ = tokio::time::sleep(READ_RETRY_DELAY) => {}
                            }
                        }
                    },
                }
            }

            reader.close().await;
            tracing::info!(topic = %topic, "consumer stopped");
        }));
    }

    /// Signal cancellation and wait for the loop to wind down. Safe to
    /// call more than once.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                tracing::error!(topic = %self.topic, error = %err, "consumer task panicked");
            }
        }
    }
}
