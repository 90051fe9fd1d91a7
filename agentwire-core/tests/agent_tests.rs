//! Agent façade tests: request bodies per protocol and system prompt handling

use agentwire_core::config::{self, AgentConfig};
use agentwire_core::protocol::{FunctionDefinition, Message, Options};
use agentwire_core::{Agent, CancellationToken};
use futures::StreamExt;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Agent bound to every protocol, served by the mock server
fn agent_config(server: &MockServer, system_prompt: &str) -> AgentConfig {
    config::from_json_str(
        &json!({
            "name": "assistant",
            "system_prompt": system_prompt,
            "transport": {
                "provider": {
                    "name": "ollama",
                    "base_url": server.uri(),
                    "model": {
                        "name": "llava",
                        "capabilities": {
                            "chat": {"format": "chat", "options": {"temperature": 0.2}},
                            "vision": {"format": "vision"},
                            "tools": {"format": "tools"},
                            "embeddings": {"format": "embeddings"}
                        }
                    }
                },
                "max_retries": 1
            }
        })
        .to_string(),
    )
    .unwrap()
}

fn chat_response(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "llava",
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

async fn last_body(server: &MockServer) -> Value {
    server
        .received_requests()
        .await
        .unwrap()
        .last()
        .unwrap()
        .body_json()
        .unwrap()
}

/// The system prompt leads the conversation
#[tokio::test]
async fn test_chat_prepends_system_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_response("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let agent = Agent::from_config(&agent_config(&server, "be brief")).unwrap();
    let response = agent
        .chat(&CancellationToken::new(), vec![Message::user("hi")], Options::new())
        .await
        .unwrap();

    assert_eq!(response.content(), Some("hello"));
    let body = last_body(&server).await;
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "be brief"},
            {"role": "user", "content": "hi"}
        ])
    );
    assert_eq!(body["temperature"], 0.2);
}

/// Images are appended to the last user message as `image_url` parts
#[tokio::test]
async fn test_vision_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_response("a cat"))
        .expect(1)
        .mount(&server)
        .await;

    let agent = Agent::from_config(&agent_config(&server, "")).unwrap();
    let response = agent
        .vision(
            &CancellationToken::new(),
            vec![Message::user("what is this?")],
            vec!["data:image/png;base64,AAA".to_string()],
            Options::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.content(), Some("a cat"));
    let body = last_body(&server).await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(
        messages[0]["content"],
        json!([
            {"type": "text", "text": "what is this?"},
            {
                "type": "image_url",
                "image_url": {"url": "data:image/png;base64,AAA", "detail": "auto"}
            }
        ])
    );
    assert!(body.get("images").is_none());
}

/// An empty image list is rejected before anything is sent
#[tokio::test]
async fn test_vision_requires_images() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(chat_response("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let agent = Agent::from_config(&agent_config(&server, "")).unwrap();
    let result = agent
        .vision(
            &CancellationToken::new(),
            vec![Message::user("what is this?")],
            Vec::new(),
            Options::new(),
        )
        .await;

    assert!(result.is_err());
}

/// Tools are wrapped as function tools and tool calls come back unexecuted
#[tokio::test]
async fn test_tools_request_and_tool_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llava",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"city\":\"Oslo\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let schema = json!({
        "type": "object",
        "properties": {"city": {"type": "string"}},
        "required": ["city"]
    });
    let agent = Agent::from_config(&agent_config(&server, "")).unwrap();
    let response = agent
        .tools(
            &CancellationToken::new(),
            vec![Message::user("weather in Oslo?")],
            vec![FunctionDefinition::new("get_weather", "Current weather", schema.clone())],
            Options::new(),
        )
        .await
        .unwrap();

    let body = last_body(&server).await;
    assert_eq!(
        body["tools"],
        json!([{
            "type": "function",
            "function": {"name": "get_weather", "description": "Current weather", "parameters": schema}
        }])
    );

    let calls = response.tool_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].function.name, "get_weather");
    let args: Value = calls[0].function.parse_arguments().unwrap();
    assert_eq!(args["city"], "Oslo");
}

/// Streaming chat through the agent
#[tokio::test]
async fn test_chat_stream() {
    let server = MockServer::start().await;

    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"Hi\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" there\"},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let agent = Agent::from_config(&agent_config(&server, "be brief")).unwrap();
    let chunks: Vec<_> = agent
        .chat_stream(&CancellationToken::new(), vec![Message::user("hi")], Options::new())
        .await
        .unwrap()
        .collect()
        .await;

    let text: String = chunks
        .iter()
        .filter_map(|chunk| chunk.as_ref().unwrap().content())
        .collect();
    assert_eq!(text, "Hi there");
    assert_eq!(chunks[1].as_ref().unwrap().finish_reason(), Some("stop"));
    assert_eq!(last_body(&server).await["stream"], true);
}

/// One input is sent as a string, several as an array
#[tokio::test]
async fn test_embed_input_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "model": "llava",
            "data": [
                {"index": 1, "embedding": [2.0]},
                {"index": 0, "embedding": [1.0]}
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let agent = Agent::from_config(&agent_config(&server, "ignored for embeddings")).unwrap();
    let cancel = CancellationToken::new();

    agent
        .embed(&cancel, vec!["one".to_string()], Options::new())
        .await
        .unwrap();
    assert_eq!(last_body(&server).await["input"], "one");

    let response = agent
        .embed(&cancel, vec!["a".to_string(), "b".to_string()], Options::new())
        .await
        .unwrap();
    let body = last_body(&server).await;
    assert_eq!(body["input"], json!(["a", "b"]));
    assert!(body.get("messages").is_none());
    assert_eq!(response.vectors(), vec![&[1.0f32][..], &[2.0f32][..]]);
}
