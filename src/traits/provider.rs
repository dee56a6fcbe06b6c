use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{Message, ToolCall};

/// Model provider — sends messages + tool defs to an LLM, gets back a
/// complete response or a stream of text fragments.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[Value],
    ) -> anyhow::Result<ProviderResponse>;

    /// Incremental delivery: a finite, single-consumer sequence of content
    /// fragments. A transport error terminates the sequence as an `Err`
    /// item; the channel closing means the response is complete. Not
    /// restartable.
    async fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[Value],
    ) -> anyhow::Result<mpsc::Receiver<anyhow::Result<String>>>;
}

/// Token usage statistics from an LLM API response.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The LLM's response: either content text, tool calls, or both.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
}
