//! CLI source — reads `SENDER|body` lines from stdin for local testing.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tokio_stream::wrappers::LinesStream;
use tracing::{error, warn};

use super::channel::{MessageSource, MessageStream};
use crate::error::ChannelError;
use crate::pipeline::types::IncomingMessage;

type LineReader = Box<dyn AsyncBufRead + Send + Unpin>;

/// Line-oriented source over stdin (or any buffered reader).
pub struct CliSource {
    reader: Mutex<Option<LineReader>>,
}

impl CliSource {
    /// Read from the process's stdin.
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        Self {
            reader: Mutex::new(Some(Box::new(reader))),
        }
    }
}

impl Default for CliSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one `SENDER|body` line.
pub fn parse_line(line: &str) -> Result<IncomingMessage, ChannelError> {
    let (sender, body) = line
        .split_once('|')
        .ok_or_else(|| ChannelError::InvalidMessage("expected SENDER|body".into()))?;
    let sender = sender.trim();
    let body = body.trim();
    if sender.is_empty() || body.is_empty() {
        return Err(ChannelError::InvalidMessage(
            "sender and body must be non-empty".into(),
        ));
    }
    Ok(IncomingMessage::new(sender, body))
}

#[async_trait]
impl MessageSource for CliSource {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let reader = self
            .reader
            .lock()
            .await
            .take()
            .ok_or_else(|| ChannelError::StartupFailed {
                name: "cli".to_string(),
                reason: "start() already called".to_string(),
            })?;

        let lines = LinesStream::new(reader.lines())
            .take_while(|line| {
                let keep = match line {
                    Ok(_) => true,
                    Err(e) => {
                        error!("Error reading stdin: {}", e);
                        false
                    }
                };
                futures::future::ready(keep)
            })
            .filter_map(|line| async move {
                let line = line.ok()?;
                if line.trim().is_empty() {
                    return None;
                }
                match parse_line(&line) {
                    Ok(msg) => Some(msg),
                    Err(e) => {
                        warn!(error = %e, "Skipping malformed input line");
                        None
                    }
                }
            });

        Ok(Box::pin(lines))
    }
}
