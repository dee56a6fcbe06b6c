//! Conversation orchestrator: drives the bounded model/tool exchange.
//!
//! The protocol is two rounds at most. Round 1 always carries the full
//! tool definition set; if the model requests tool calls they execute
//! synchronously, in the order returned, and exactly one follow-up model
//! call is issued. Tool calls in that second response are dropped — a
//! known protocol limit, not an error.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::sun_sign;
use crate::tools::{tool_definitions, ToolRegistry};
use crate::traits::{Message, ModelProvider, ProviderResponse};
use crate::types::ConversationContext;

pub struct Agent {
    context: ConversationContext,
    transport: Arc<dyn ModelProvider>,
    registry: ToolRegistry,
    model: String,
}

impl Agent {
    pub fn new(
        context: ConversationContext,
        transport: Arc<dyn ModelProvider>,
        registry: ToolRegistry,
        model: impl Into<String>,
    ) -> Self {
        info!(
            birth_datetime = %context.birth_datetime,
            transit_datetime = %context.transit_datetime,
            "Agent initialized"
        );
        Self {
            context,
            transport,
            registry,
            model: model.into(),
        }
    }

    fn system_prompt(&self) -> Message {
        // The date prefix of an ISO-8601 datetime parses as a NaiveDate.
        let sun = self
            .context
            .birth_datetime
            .get(..10)
            .and_then(|date| date.parse::<chrono::NaiveDate>().ok())
            .map(sun_sign);
        let sun_line = match sun {
            Some(sign) => format!(" Their Sun sign is {}.", sign),
            None => String::new(),
        };
        Message::system(format!(
            "You are a mystic AI astrologer. \
             You have access to the user's birth chart data implicitly. \
             The user's birth date is {}.{sun_line}\n\n\
             Your goal is to answer questions using astrological insights.\n\n\
             TOOLS:\n\
             1. 'get_daily_transit_context': Use this if the user asks about their day, current vibe, or future planetary influence.\n\
             2. 'get_natal_chart_context': Use this if the user's question needs their natal chart data (e.g., 'What is my rising sign?', 'Do I have a Scorpio Moon?', 'Explain my 7th house').\n\n\
             Do not guess. Use the appropriate tool to get the real data.\n\n\
             When interpreting tool output:\n\
             - Be empathetic but honest.\n\
             - Explain technical terms simply.\n\
             - Keep it conversational.",
            self.context.birth_datetime
        ))
    }

    /// Round 1: full history + tool definitions, never streamed (tool-call
    /// detection requires a complete message).
    async fn first_round(
        &self,
        history: Vec<Message>,
    ) -> anyhow::Result<(Vec<Message>, ProviderResponse)> {
        let mut messages = vec![self.system_prompt()];
        messages.extend(history);
        let response = self
            .transport
            .chat(&self.model, &messages, &tool_definitions())
            .await?;
        if let Some(usage) = &response.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Round 1 complete"
            );
        }
        Ok((messages, response))
    }

    /// Execute the requested tool calls sequentially, in the order the
    /// model returned them, appending the assistant request and each tool
    /// result to the message list.
    async fn run_tool_calls(&self, messages: &mut Vec<Message>, response: &ProviderResponse) {
        info!(
            tools = ?response.tool_calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "Model requested tool calls"
        );
        messages.push(Message::assistant_tool_calls(
            response.content.clone(),
            response.tool_calls.clone(),
        ));
        for call in &response.tool_calls {
            let result = self.registry.execute(call, &self.context).await;
            messages.push(Message::tool_result(&call.id, result));
        }
    }

    /// Blocking mode: returns the final text in one piece.
    pub async fn chat(&self, history: Vec<Message>) -> anyhow::Result<String> {
        info!("Agent starting new chat turn");
        let (mut messages, first) = self.first_round(history).await?;

        if first.tool_calls.is_empty() {
            debug!("Model returned direct response");
            return Ok(first.content.unwrap_or_default());
        }

        self.run_tool_calls(&mut messages, &first).await;

        let last = self
            .transport
            .chat(&self.model, &messages, &tool_definitions())
            .await?;
        if !last.tool_calls.is_empty() {
            warn!(
                dropped = last.tool_calls.len(),
                "Dropping second-round tool calls (two-round protocol limit)"
            );
        }
        Ok(last.content.unwrap_or_default())
    }

    /// Streaming mode: a finite, single-consumer sequence of text
    /// fragments. When no tool call is needed the round-1 content arrives
    /// as one fragment; otherwise round 2 is requested with incremental
    /// delivery. A transport error mid-stream reaches the consumer as an
    /// `Err` item.
    pub async fn chat_stream(
        &self,
        history: Vec<Message>,
    ) -> anyhow::Result<mpsc::Receiver<anyhow::Result<String>>> {
        info!("Agent starting new streaming chat turn");
        let (mut messages, first) = self.first_round(history).await?;

        if first.tool_calls.is_empty() {
            debug!("Model returned direct response; yielding single fragment");
            let (tx, rx) = mpsc::channel(1);
            let content = first.content.unwrap_or_default();
            tokio::spawn(async move {
                let _ = tx.send(Ok(content)).await;
            });
            return Ok(rx);
        }

        self.run_tool_calls(&mut messages, &first).await;

        self.transport
            .chat_stream(&self.model, &messages, &tool_definitions())
            .await
    }
}
