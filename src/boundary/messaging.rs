//! Messaging collaborator contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ReefResult;

/// A delivered message.
#[derive(Debug, Clone)]
pub struct Message {
    pub subject: String,
    pub payload: Vec<u8>,
}

/// Outcome a handler reports for one delivery.
///
/// A successfully handled message must be acknowledged; a failed handler
/// must NOT acknowledge and must return `Nak` so the broker redelivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    Ack,
    Nak,
}

/// Handler invoked per delivery on a consumer.
pub type MessageHandler = Arc<dyn Fn(&Message) -> HandleOutcome + Send + Sync>;

/// A subject/queue broker with durable consumers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messaging: Send + Sync {
    /// Publishes `payload` on `subject`.
    async fn publish(&self, subject: &str, payload: &[u8]) -> ReefResult<()>;

    /// Binds `handler` as `consumer` on `stream`, receiving messages
    /// matching `subject`. The implementation acknowledges deliveries the
    /// handler `Ack`s and negatively acknowledges the rest.
    async fn subscribe(
        &self,
        subject: &str,
        stream: &str,
        consumer: &str,
        handler: MessageHandler,
    ) -> ReefResult<()>;

    /// Publishes `payload` and awaits a reply for at most `timeout`.
    async fn request(&self, subject: &str, payload: &[u8], timeout: Duration)
        -> ReefResult<Vec<u8>>;
}

/// A key-value bucket with an optional time-to-live on entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvBucket: Send + Sync {
    async fn put(&self, key: &str, value: &[u8]) -> ReefResult<()>;

    async fn get(&self, key: &str) -> ReefResult<Option<Vec<u8>>>;

    async fn delete(&self, key: &str) -> ReefResult<()>;

    /// Entry lifetime configured on the bucket, if any.
    fn ttl(&self) -> Option<Duration>;
}
