//! Property tests for capability and model invariants

use agentwire_core::capabilities::{
    Capability, CapabilityRegistry, ChatCapability, OptionDescriptor, StreamingCapability,
    VisionCapability,
};
use agentwire_core::config::ModelConfig;
use agentwire_core::model::Model;
use agentwire_core::protocol::{ChatResponse, Message, MessageContent, Options, Protocol};
use proptest::prelude::*;
use proptest::sample::subsequence;
use serde_json::{json, Value};

fn option_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,12}".prop_map(Value::from),
    ]
}

fn chat_keys() -> Vec<String> {
    ChatCapability::new()
        .descriptors()
        .iter()
        .map(|d| d.key.clone())
        .collect()
}

/// Any subset of declared keys, with arbitrary values
fn declared_options() -> impl Strategy<Value = Options> {
    let keys = chat_keys();
    let len = keys.len();
    subsequence(keys, 0..=len).prop_flat_map(|keys| {
        proptest::collection::vec(option_value(), keys.len()).prop_map(move |values| {
            keys.iter().cloned().zip(values).collect::<Options>()
        })
    })
}

fn conversation() -> impl Strategy<Value = Vec<Message>> {
    proptest::collection::vec("[a-zA-Z ]{1,20}", 0..4).prop_map(|history| {
        let mut messages: Vec<Message> = history
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                if i % 2 == 0 {
                    Message::user(text)
                } else {
                    Message::assistant(text)
                }
            })
            .collect();
        messages.push(Message::user("describe"));
        messages
    })
}

proptest! {
    #[test]
    fn declared_keys_always_validate(options in declared_options()) {
        prop_assert!(ChatCapability::new().validate_options(&options).is_ok());
    }

    #[test]
    fn undeclared_key_always_rejected(
        options in declared_options(),
        key in "x_[a-z]{1,8}",
        value in option_value(),
    ) {
        let mut options = options;
        options.insert(key, value);
        prop_assert!(ChatCapability::new().validate_options(&options).is_err());
    }

    #[test]
    fn missing_required_key_rejected(value in option_value(), include in any::<bool>()) {
        let capability = ChatCapability::with_descriptors(
            "strict-chat",
            vec![OptionDescriptor::required("seed"), OptionDescriptor::optional("user")],
        );
        let mut options = Options::new();
        options.insert("user".to_string(), value.clone());
        if include {
            options.insert("seed".to_string(), value);
        }
        prop_assert_eq!(capability.validate_options(&options).is_ok(), include);
    }

    #[test]
    fn process_options_is_idempotent(options in declared_options()) {
        let capability = VisionCapability::new();
        let once = capability.process_options(&options).unwrap();
        let twice = capability.process_options(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_leaves_inputs_untouched(stored in declared_options(), call in declared_options()) {
        let config = ModelConfig::new("m").with_capability(Protocol::Chat, "chat", stored.clone());
        let model = Model::from_config_with(&config, &CapabilityRegistry::with_defaults()).unwrap();

        let merged = model.merge_request_options(Protocol::Chat, &call);

        prop_assert_eq!(model.options(Protocol::Chat), Some(&stored));
        for (key, value) in &call {
            prop_assert_eq!(&merged[key], value);
        }
        for (key, value) in &stored {
            if !call.contains_key(key) {
                prop_assert_eq!(&merged[key], value);
            }
        }
        prop_assert_eq!(
            model.merge_request_options(Protocol::Chat, &Options::new()),
            stored
        );
    }

    #[test]
    fn streaming_bodies_request_a_stream(messages in conversation()) {
        let registry = CapabilityRegistry::with_defaults();
        let images = json!({"images": ["http://example.com/cat.png"]});
        let tools = json!({"tools": [{"name": "f", "description": "", "parameters": {"type": "object"}}]});

        for (format, options) in [("chat", json!({})), ("vision", images), ("tools", tools)] {
            let handle = registry.get(format).unwrap();
            let capability = handle.as_streaming().unwrap();
            let options = options.as_object().cloned().unwrap();

            let streaming = capability
                .create_streaming_request(&messages, &options, "m")
                .unwrap();
            prop_assert!(streaming.is_streaming());
            prop_assert_eq!(&streaming.to_value().unwrap()["stream"], &json!(true));

            let buffered = capability.create_request(&messages, &options, "m").unwrap();
            prop_assert!(buffered.to_value().unwrap().get("stream").is_none());
        }
    }

    #[test]
    fn vision_preserves_message_count(
        messages in conversation(),
        images in proptest::collection::vec("https://img\\.example/[a-z]{1,8}\\.png", 1..4),
    ) {
        let options = json!({"images": images.clone()}).as_object().cloned().unwrap();
        let body = VisionCapability::new()
            .create_request(&messages, &options, "m")
            .unwrap()
            .to_value()
            .unwrap();

        let sent = body["messages"].as_array().unwrap();
        prop_assert_eq!(sent.len(), messages.len());

        let parts = sent.last().unwrap()["content"].as_array().unwrap();
        prop_assert_eq!(parts.len(), images.len() + 1);
        for (part, url) in parts[1..].iter().zip(&images) {
            prop_assert_eq!(&part["image_url"]["url"], &json!(url));
        }
    }

    #[test]
    fn chat_response_round_trips(content in ".{0,64}") {
        let body = json!({
            "id": "chatcmpl-1",
            "model": "m",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        });
        let parsed = ChatCapability::new()
            .parse_response(body.to_string().as_bytes())
            .unwrap()
            .into_chat()
            .unwrap();
        prop_assert_eq!(parsed.content(), Some(content.as_str()));

        let reparsed: ChatResponse = serde_json::from_value(serde_json::to_value(&parsed).unwrap()).unwrap();
        prop_assert_eq!(&reparsed, &parsed);
        prop_assert_eq!(
            reparsed.choices[0].message.content.clone(),
            Some(MessageContent::Text(content))
        );
    }
}
