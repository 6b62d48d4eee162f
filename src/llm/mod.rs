//! Chat model collaborator seam
//!
//! Provider clients live outside this crate; they plug in through
//! [`ChatModel`] and are shared through a caller-owned [`ModelCache`].

pub mod cache;

pub use cache::{ModelCache, ModelKey};

use crate::context::Message;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

/// A chat-completion capable model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Complete the conversation and return the assistant reply
    async fn invoke(&self, messages: &[Message]) -> Result<String>;

    /// Stream the reply as text deltas; defaults to a single delta from `invoke`
    fn stream<'a>(&'a self, messages: &'a [Message]) -> BoxStream<'a, Result<String>> {
        stream::once(self.invoke(messages)).boxed()
    }
}
