//! End-to-end orchestration tests: the real agent, tool registry, and
//! engine over a scripted mock transport and chart provider.

use std::sync::Arc;

use crate::agent::Agent;
use crate::engine::{StructuredGenerator, ZodiacEngine};
use crate::testing::{natal_fixture, transit_fixture, MockChartProvider, MockProvider};
use crate::tools::ToolRegistry;
use crate::traits::{Message, ProviderResponse, Role};
use crate::types::ConversationContext;

fn setup(responses: Vec<ProviderResponse>) -> (Arc<MockProvider>, Arc<MockChartProvider>, Agent) {
    let provider = Arc::new(MockProvider::with_responses(responses));
    let chart = MockChartProvider::new(natal_fixture(), transit_fixture()).shared();
    let generator = StructuredGenerator::new(provider.clone(), "mock-model", 3);
    let engine = Arc::new(ZodiacEngine::new(chart.clone(), generator, 3));
    let context = ConversationContext::new(
        "2000-01-01T00:00:00+00:00",
        "25.03,121.56",
        "2025-05-05T00:00:00+00:00",
        None,
    );
    let agent = Agent::new(context, provider.clone(), ToolRegistry::new(engine), "mock-model");
    (provider, chart, agent)
}

#[tokio::test]
async fn direct_response_is_returned_unchanged() {
    let (provider, _chart, agent) = setup(vec![MockProvider::text_response(
        "The stars are quiet today.",
    )]);

    let response = agent
        .chat(vec![Message::user("Say something nice")])
        .await
        .unwrap();
    assert_eq!(response, "The stars are quiet today.");

    let log = provider.call_log.lock().await;
    assert_eq!(log.len(), 1);
    // Round 1 carries the system prompt and the full tool definition set.
    assert_eq!(log[0].messages[0].role, Role::System);
    let system = log[0].messages[0].content.as_deref().unwrap();
    // Birth date 2000-01-01 puts the Sun in Capricorn.
    assert!(system.contains("Capricorn"));
    assert_eq!(log[0].tools.len(), 2);
}

#[tokio::test]
async fn natal_tool_receives_context_not_model_arguments() {
    let (provider, chart, agent) = setup(vec![
        MockProvider::tool_call_response(vec![("call_1", "get_natal_chart_context", "{}")]),
        MockProvider::text_response("Your rising sign is Aquarius."),
    ]);

    let response = agent
        .chat(vec![Message::user("What is my rising sign?")])
        .await
        .unwrap();
    assert_eq!(response, "Your rising sign is Aquarius.");

    // The executor supplied birth data from context; the model's
    // arguments were empty.
    let natal_calls = chart.natal_calls.lock().await;
    assert_eq!(natal_calls.len(), 1);
    assert_eq!(natal_calls[0].0, "2000-01-01T00:00:00+00:00");
    assert_eq!(natal_calls[0].1, "25.03,121.56");

    let log = provider.call_log.lock().await;
    assert_eq!(log.len(), 2);
    // Round 2 sees the assistant's own tool request and the tool result.
    let round2 = &log[1].messages;
    let assistant = round2.iter().find(|m| !m.tool_calls.is_empty()).unwrap();
    assert_eq!(assistant.tool_calls[0].id, "call_1");
    let tool_msg = round2.iter().find(|m| m.role == Role::Tool).unwrap();
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
    assert!(tool_msg.content.as_deref().unwrap().contains("Capricorn"));
}

#[tokio::test]
async fn tool_calls_execute_in_model_order() {
    let (provider, _chart, agent) = setup(vec![
        MockProvider::tool_call_response(vec![
            (
                "call_1",
                "get_daily_transit_context",
                "{\"transit_datetime\":\"2025-05-05T00:00:00+00:00\"}",
            ),
            ("call_2", "get_natal_chart_context", "{}"),
        ]),
        MockProvider::text_response("Busy skies."),
    ]);

    agent.chat(vec![Message::user("Full reading please")]).await.unwrap();

    let log = provider.call_log.lock().await;
    let tool_results: Vec<&str> = log[1]
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.tool_call_id.as_deref().unwrap())
        .collect();
    assert_eq!(tool_results, vec!["call_1", "call_2"]);
}

#[tokio::test]
async fn unknown_tool_degrades_instead_of_aborting() {
    let (provider, _chart, agent) = setup(vec![
        MockProvider::tool_call_response(vec![("call_1", "read_tarot", "{}")]),
        MockProvider::text_response("I can't read tarot, but the stars say hello."),
    ]);

    let response = agent.chat(vec![Message::user("Read my tarot")]).await.unwrap();
    assert_eq!(response, "I can't read tarot, but the stars say hello.");

    let log = provider.call_log.lock().await;
    let tool_msg = log[1]
        .messages
        .iter()
        .find(|m| m.role == Role::Tool)
        .unwrap();
    assert_eq!(tool_msg.content.as_deref(), Some("{\"error\":\"Unknown tool\"}"));
}

#[tokio::test]
async fn second_round_tool_calls_are_dropped() {
    let mut second = MockProvider::tool_call_response(vec![("call_9", "get_natal_chart_context", "{}")]);
    second.content = Some("Here is what I found anyway.".to_string());
    let (provider, chart, agent) = setup(vec![
        MockProvider::tool_call_response(vec![("call_1", "get_natal_chart_context", "{}")]),
        second,
    ]);

    let response = agent.chat(vec![Message::user("Explain my chart")]).await.unwrap();
    // Content returned as-is; the second batch of tool calls never runs.
    assert_eq!(response, "Here is what I found anyway.");
    assert_eq!(chart.natal_calls.lock().await.len(), 1);
    assert_eq!(provider.chat_calls().await, 2);
}

#[tokio::test]
async fn transport_failure_surfaces_to_caller() {
    let provider = Arc::new(MockProvider::failing("provider unreachable"));
    let chart = MockChartProvider::new(natal_fixture(), transit_fixture()).shared();
    let generator = StructuredGenerator::new(provider.clone(), "mock-model", 3);
    let engine = Arc::new(ZodiacEngine::new(chart, generator, 3));
    let context = ConversationContext::new(
        "2000-01-01T00:00:00+00:00",
        "25.03,121.56",
        "2025-05-05T00:00:00+00:00",
        None,
    );
    let agent = Agent::new(context, provider, ToolRegistry::new(engine), "mock-model");

    let err = agent.chat(vec![Message::user("hi")]).await.unwrap_err();
    assert!(err.to_string().contains("provider unreachable"));
}

#[tokio::test]
async fn streaming_without_tools_yields_one_fragment() {
    let (provider, _chart, agent) = setup(vec![MockProvider::text_response("All calm in the cosmos.")]);

    let mut rx = agent
        .chat_stream(vec![Message::user("Quick check-in")])
        .await
        .unwrap();

    let mut fragments = Vec::new();
    while let Some(item) = rx.recv().await {
        fragments.push(item.unwrap());
    }
    assert_eq!(fragments, vec!["All calm in the cosmos.".to_string()]);

    let log = provider.call_log.lock().await;
    assert_eq!(log.len(), 1);
    assert!(!log[0].streamed);
}

#[tokio::test]
async fn streaming_with_tools_streams_round_two() {
    let (provider, chart, agent) = setup(vec![
        MockProvider::tool_call_response(vec![
            (
                "call_1",
                "get_daily_transit_context",
                "{\"transit_datetime\":\"2025-05-05T00:00:00+00:00\"}",
            ),
        ]),
        MockProvider::text_response("Expect friction this morning, relief tonight."),
    ]);

    let mut rx = agent.chat_stream(vec![Message::user("How's my day?")]).await.unwrap();

    let mut assembled = String::new();
    let mut count = 0;
    while let Some(item) = rx.recv().await {
        assembled.push_str(&item.unwrap());
        count += 1;
    }
    assert_eq!(assembled, "Expect friction this morning, relief tonight.");
    assert!(count > 1, "round 2 should arrive in multiple fragments");

    assert_eq!(chart.transit_calls.lock().await.len(), 1);
    let log = provider.call_log.lock().await;
    assert_eq!(log.len(), 2);
    assert!(!log[0].streamed);
    assert!(log[1].streamed);
}
