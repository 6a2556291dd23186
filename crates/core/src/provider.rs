//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider knows how to send a list of chat messages to a language model
//! and get text back, either as a complete message or as a stream of
//! fragments. The router only ever depends on this shape; HTTP and wire
//! formats stay inside the implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::message::Message;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "mistral-tiny")
    pub model: String,

    /// The conversation messages, in order
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
}

fn default_temperature() -> f32 {
    0.7
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage info (typically only in the final chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl StreamChunk {
    /// A content-only delta.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            done: false,
            usage: None,
        }
    }

    /// The terminal chunk of a stream.
    pub fn finished() -> Self {
        Self {
            content: None,
            done: true,
            usage: None,
        }
    }
}

/// Receiving half of a streamed response.
///
/// A stream ends either with a chunk whose `done` flag is set, or with an
/// `Err` item. A channel that closes without either is an interrupted stream.
pub type ChunkReceiver = mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>;

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The router calls `stream()`
/// without knowing which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "mistral").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Send a request and get a stream of response chunks.
    ///
    /// Default implementation calls `complete()` and wraps the result as a single chunk.
    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        let response = self.complete(request).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                content: Some(response.message.content),
                done: true,
                usage: response.usage,
            }))
            .await;
        Ok(rx)
    }
}

/// Drain a chunk stream into the full response text.
///
/// Returns an error if the provider reported one, or if the channel closed
/// before a `done` chunk arrived.
pub async fn collect_stream(mut rx: ChunkReceiver) -> std::result::Result<String, ProviderError> {
    let mut text = String::new();
    while let Some(item) = rx.recv().await {
        let chunk = item?;
        if let Some(content) = chunk.content {
            text.push_str(&content);
        }
        if chunk.done {
            return Ok(text);
        }
    }
    Err(ProviderError::StreamInterrupted(
        "stream closed before completion".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider;

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant(format!("echo: {}", request.messages.len())),
                usage: None,
                model: request.model,
            })
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "mistral-tiny".into(),
            messages: vec![Message::user("hi")],
            temperature: default_temperature(),
            max_tokens: Some(16),
            stream: true,
        }
    }

    #[test]
    fn provider_request_defaults() {
        let req: ProviderRequest =
            serde_json::from_str(r#"{"model":"m","messages":[]}"#).unwrap();
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(!req.stream);
        assert!(req.max_tokens.is_none());
    }

    #[tokio::test]
    async fn default_stream_wraps_complete() {
        let rx = FixedProvider.stream(request()).await.unwrap();
        let text = collect_stream(rx).await.unwrap();
        assert_eq!(text, "echo: 1");
    }

    #[tokio::test]
    async fn collect_concatenates_deltas() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Ok(StreamChunk::text("The capital "))).await.unwrap();
        tx.send(Ok(StreamChunk::text("is Paris."))).await.unwrap();
        tx.send(Ok(StreamChunk::finished())).await.unwrap();
        assert_eq!(collect_stream(rx).await.unwrap(), "The capital is Paris.");
    }

    #[tokio::test]
    async fn collect_surfaces_stream_errors() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Ok(StreamChunk::text("partial"))).await.unwrap();
        tx.send(Err(ProviderError::Network("reset".into()))).await.unwrap();
        let err = collect_stream(rx).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }

    #[tokio::test]
    async fn collect_rejects_truncated_stream() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Ok(StreamChunk::text("partial"))).await.unwrap();
        drop(tx);
        let err = collect_stream(rx).await.unwrap_err();
        assert!(matches!(err, ProviderError::StreamInterrupted(_)));
    }
}
