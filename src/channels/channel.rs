//! `MessageSource` trait — where incoming text messages come from.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;
use crate::pipeline::types::IncomingMessage;

/// Stream of captured messages produced by a source.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A transport that emits incoming messages.
///
/// The pipeline only consumes the stream; it makes no assumption about
/// delivery order or reliability.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Begin producing messages. May only be called once.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Release source resources.
    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
