//! Source manager — merges every registered source into one stream.

use futures::stream;
use tracing::{info, warn};

use super::channel::{MessageSource, MessageStream};
use crate::error::ChannelError;

/// Owns the configured message sources.
#[derive(Default)]
pub struct SourceManager {
    sources: Vec<Box<dyn MessageSource>>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source.
    pub fn add(&mut self, source: Box<dyn MessageSource>) {
        self.sources.push(source);
    }

    /// Names of the registered sources, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Start every source and merge their streams.
    ///
    /// The merged stream ends once all sources have ended.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let stream = source.start().await?;
            info!(source = source.name(), "Message source started");
            streams.push(stream);
        }
        Ok(Box::pin(stream::select_all(streams)))
    }

    /// Shut down every source, logging failures.
    pub async fn shutdown_all(&self) {
        for source in &self.sources {
            if let Err(e) = source.shutdown().await {
                warn!(source = source.name(), error = %e, "Source shutdown failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::StreamExt;

    use super::*;
    use crate::pipeline::types::IncomingMessage;

    struct FixedSource {
        name: &'static str,
        bodies: Vec<&'static str>,
    }

    #[async_trait]
    impl MessageSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            let messages: Vec<IncomingMessage> = self
                .bodies
                .iter()
                .map(|b| IncomingMessage::new(self.name, *b))
                .collect();
            Ok(Box::pin(stream::iter(messages)))
        }
    }

    #[tokio::test]
    async fn merges_all_sources() {
        let mut manager = SourceManager::new();
        manager.add(Box::new(FixedSource {
            name: "a",
            bodies: vec!["one", "two"],
        }));
        manager.add(Box::new(FixedSource {
            name: "b",
            bodies: vec!["three"],
        }));
        assert_eq!(manager.names(), vec!["a", "b"]);

        let merged: Vec<IncomingMessage> = manager.start_all().await.unwrap().collect().await;
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.iter().filter(|m| m.sender == "a").count(), 2);
    }

    #[tokio::test]
    async fn empty_manager_stream_ends_immediately() {
        let manager = SourceManager::new();
        assert!(manager.is_empty());
        let mut stream = manager.start_all().await.unwrap();
        assert!(stream.next().await.is_none());
    }
}
