//! Test infrastructure: MockProvider, MockChartProvider, and payload
//! fixtures shared by the engine, tool, and agent tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};

use crate::traits::{ChartProvider, Message, ModelProvider, ProviderResponse, TokenUsage, ToolCall};

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

/// A recorded call to `MockProvider::chat()` / `chat_stream()`.
#[derive(Debug, Clone)]
pub struct MockChatCall {
    pub messages: Vec<Message>,
    pub tools: Vec<Value>,
    pub streamed: bool,
}

/// Mock LLM transport that returns scripted responses in FIFO order.
pub struct MockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    pub call_log: Mutex<Vec<MockChatCall>>,
    fail_message: Option<String>,
}

impl MockProvider {
    /// A provider with a FIFO queue of scripted responses. Once the queue
    /// is empty every call answers "Mock response".
    pub fn with_responses(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_log: Mutex::new(Vec::new()),
            fail_message: None,
        }
    }

    /// A provider whose every call fails at the transport level.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            call_log: Mutex::new(Vec::new()),
            fail_message: Some(message.to_string()),
        }
    }

    /// Helper: build a text-only ProviderResponse.
    pub fn text_response(text: &str) -> ProviderResponse {
        ProviderResponse {
            content: Some(text.to_string()),
            tool_calls: vec![],
            usage: Some(TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            }),
        }
    }

    /// Helper: build a tool-call ProviderResponse.
    pub fn tool_call_response(calls: Vec<(&str, &str, &str)>) -> ProviderResponse {
        ProviderResponse {
            content: None,
            tool_calls: calls
                .into_iter()
                .map(|(id, name, arguments)| ToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                })
                .collect(),
            usage: None,
        }
    }

    /// Number of transport calls made so far (blocking + streamed).
    pub async fn chat_calls(&self) -> usize {
        self.call_log.lock().await.len()
    }

    async fn next_response(&self) -> ProviderResponse {
        let mut queue = self.responses.lock().await;
        if queue.is_empty() {
            Self::text_response("Mock response")
        } else {
            queue.remove(0)
        }
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    async fn chat(
        &self,
        _model: &str,
        messages: &[Message],
        tools: &[Value],
    ) -> anyhow::Result<ProviderResponse> {
        self.call_log.lock().await.push(MockChatCall {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            streamed: false,
        });
        if let Some(msg) = &self.fail_message {
            anyhow::bail!("{}", msg);
        }
        Ok(self.next_response().await)
    }

    async fn chat_stream(
        &self,
        _model: &str,
        messages: &[Message],
        tools: &[Value],
    ) -> anyhow::Result<mpsc::Receiver<anyhow::Result<String>>> {
        self.call_log.lock().await.push(MockChatCall {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            streamed: true,
        });
        if let Some(msg) = &self.fail_message {
            anyhow::bail!("{}", msg);
        }
        let response = self.next_response().await;
        let content = response.content.unwrap_or_default();
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            // Deliver the scripted content word by word so consumers see
            // a genuine multi-fragment sequence.
            for fragment in content.split_inclusive(' ') {
                if tx.send(Ok(fragment.to_string())).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

// ---------------------------------------------------------------------------
// MockChartProvider
// ---------------------------------------------------------------------------

/// Mock chart provider returning fixture payloads and recording the
/// arguments it was called with.
pub struct MockChartProvider {
    natal_payload: Value,
    transit_payload: Value,
    pub natal_calls: Mutex<Vec<(String, String)>>,
    pub transit_calls: Mutex<Vec<(String, String, String, String)>>,
    fail_message: Option<String>,
}

impl MockChartProvider {
    pub fn new(natal_payload: Value, transit_payload: Value) -> Self {
        Self {
            natal_payload,
            transit_payload,
            natal_calls: Mutex::new(Vec::new()),
            transit_calls: Mutex::new(Vec::new()),
            fail_message: None,
        }
    }

    /// A chart provider whose every call fails.
    pub fn failing(message: &str) -> Self {
        let mut provider = Self::new(json!({}), json!({}));
        provider.fail_message = Some(message.to_string());
        provider
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl ChartProvider for MockChartProvider {
    async fn natal_planet_position(
        &self,
        datetime: &str,
        coordinates: &str,
    ) -> anyhow::Result<Value> {
        self.natal_calls
            .lock()
            .await
            .push((datetime.to_string(), coordinates.to_string()));
        if let Some(msg) = &self.fail_message {
            anyhow::bail!("{}", msg);
        }
        Ok(self.natal_payload.clone())
    }

    async fn transit_planet_position(
        &self,
        birth_datetime: &str,
        birth_coordinates: &str,
        transit_datetime: &str,
        current_coordinates: &str,
    ) -> anyhow::Result<Value> {
        self.transit_calls.lock().await.push((
            birth_datetime.to_string(),
            birth_coordinates.to_string(),
            transit_datetime.to_string(),
            current_coordinates.to_string(),
        ));
        if let Some(msg) = &self.fail_message {
            anyhow::bail!("{}", msg);
        }
        Ok(self.transit_payload.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Natal planet-position payload in the chart provider's wire shape.
pub fn natal_fixture() -> Value {
    json!({
        "status": "ok",
        "data": {
            "planet_positions": [
                { "name": "Sun", "zodiac": { "name": "Capricorn" }, "house_number": 12, "degree": 10.8136 },
                { "name": "Moon", "zodiac": { "name": "Scorpio" }, "house_number": 4, "degree": 7.93 },
                { "name": "Mercury", "zodiac": { "name": "Capricorn" }, "house_number": 12, "degree": 8.02 },
                { "name": "Venus", "zodiac": { "name": "Sagittarius" }, "house_number": 11, "degree": 4.31 },
                { "name": "Mars", "zodiac": { "name": "Taurus" }, "house_number": 3, "degree": 5.66 },
                { "name": "Chiron", "zodiac": { "name": "Aries" }, "house_number": 2, "degree": 19.0 }
            ],
            "angles": [
                { "name": "Ascendant", "zodiac": { "name": "Aquarius" }, "degree": 17.52 },
                { "name": "Mid Heaven", "zodiac": { "name": "Scorpio" }, "degree": 18.94 },
                { "name": "Descendant", "zodiac": { "name": "Leo" }, "degree": 17.52 }
            ],
            "aspects": [
                {
                    "planet_one": { "name": "Moon" },
                    "planet_two": { "name": "Mars" },
                    "aspect": { "name": "Opposition" },
                    "orb": 2.2
                },
                {
                    "planet_one": { "name": "Moon" },
                    "planet_two": { "name": "Mercury" },
                    "aspect": { "name": "Square" },
                    "orb": 0.053
                },
                {
                    "planet_one": { "name": "Venus" },
                    "planet_two": { "name": "Mars" },
                    "aspect": { "name": "Semi Sextile" },
                    "orb": 1.3
                },
                {
                    "planet_one": { "name": "Moon" },
                    "planet_two": { "name": "Uranus" },
                    "aspect": { "name": "Trine" },
                    "orb": 1.8
                }
            ],
            "houses": [
                { "number": 1, "start_cusp": { "zodiac": { "name": "Aquarius" } } },
                { "number": 10, "start_cusp": { "zodiac": { "name": "Scorpio" } } },
                { "number": 11, "start_cusp": {} }
            ]
        }
    })
}

/// Transit payload with three Hard and three Soft aspects inside their
/// orb limits, plus entries the filter must drop.
pub fn transit_fixture() -> Value {
    json!({
        "status": "ok",
        "data": {
            "transit_natal_aspects": [
                {
                    "planet_one": { "name": "Sun" },
                    "planet_two": { "name": "Mars" },
                    "aspect": { "name": "Square" },
                    "orb": 1.1
                },
                {
                    "planet_one": { "name": "Venus" },
                    "planet_two": { "name": "Jupiter" },
                    "aspect": { "name": "Trine" },
                    "orb": 0.8
                },
                {
                    "planet_one": { "name": "Moon" },
                    "planet_two": { "name": "Venus" },
                    "aspect": { "name": "Opposition" },
                    "orb": 0.3
                },
                {
                    "planet_one": { "name": "Mars" },
                    "planet_two": { "name": "Moon" },
                    "aspect": { "name": "Square" },
                    "orb": 2.0
                },
                {
                    "planet_one": { "name": "Mercury" },
                    "planet_two": { "name": "Neptune" },
                    "aspect": { "name": "Sextile" },
                    "orb": 1.5
                },
                {
                    "planet_one": { "name": "Jupiter" },
                    "planet_two": { "name": "Sun" },
                    "aspect": { "name": "Trine" },
                    "orb": 0.9
                },
                {
                    "planet_one": { "name": "Saturn" },
                    "planet_two": { "name": "Moon" },
                    "aspect": { "name": "Conjunction" },
                    "orb": 1.4
                },
                {
                    "planet_one": { "name": "Venus" },
                    "planet_two": { "name": "Pluto" },
                    "aspect": { "name": "Quincunx" },
                    "orb": 0.2
                }
            ]
        }
    })
}

/// A schema-conforming portrait as the model should emit it.
pub fn portrait_json() -> String {
    json!({
        "core_identity": {
            "content": "Capricorn Sun in the twelfth house with a Scorpio Moon points to a private, driven interior life.",
            "summary": "A determined builder."
        },
        "psychological_dynamics": {
            "content": "The exact Moon-Mercury square keeps feeling and thinking in productive tension.",
            "summary": "Head and heart negotiate constantly."
        },
        "drive_career_values": {
            "content": "Mars in Taurus grinds steadily while Venus in Sagittarius wants meaning over comfort.",
            "summary": "Slow persistence in service of big ideals."
        },
        "growth_pathway": {
            "content": "Learning to voice the inner world instead of managing it silently is the growth edge.",
            "summary": "Speak the feelings, don't administrate them."
        }
    })
    .to_string()
}
