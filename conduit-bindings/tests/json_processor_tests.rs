use conduit_bindings::JsonProcessor;
use conduit_service::{ExecutionContext, ProcessorService};
use conduit_types::ParameterMap;
use serde_json::{Value, json};
use std::sync::Arc;

async fn process(data: Value, params: ParameterMap) -> conduit_model::ProcessingResult {
    let service = ProcessorService::new(Arc::new(JsonProcessor::new()));
    let mut context = ExecutionContext::new(params.clone());
    service.process(&data, &params, &mut context).await
}

fn transformation(kind: &str) -> ParameterMap {
    ParameterMap::new().with("TransformationType", kind)
}

#[tokio::test]
async fn minify_round_trips() {
    let result = process(json!("{ \"a\" : 1 }"), transformation("Minify")).await;
    let text = result.data().and_then(Value::as_str).unwrap().to_string();
    assert_eq!(text, r#"{"a":1}"#);
    let reparsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(reparsed, json!({"a": 1}));
}

#[tokio::test]
async fn prettify_spans_lines() {
    let result = process(json!({"a": {"b": 2}}), transformation("prettify")).await;
    let text = result.data().and_then(Value::as_str).unwrap();
    assert!(text.contains('\n'));
    assert_eq!(serde_json::from_str::<Value>(text).unwrap(), json!({"a": {"b": 2}}));
}

#[tokio::test]
async fn extract_by_pointer() {
    let params = transformation("Extract").with("Path", "/items/1/name");
    let result = process(json!(r#"{"items":[{"name":"a"},{"name":"b"}]}"#), params).await;
    assert_eq!(result.data(), Some(&json!("b")));
}

#[tokio::test]
async fn flatten_document() {
    let result = process(json!({"a": {"b": [1, 2]}}), transformation("Flatten")).await;
    assert_eq!(result.data(), Some(&json!({"a.b.0": 1, "a.b.1": 2})));
}

#[tokio::test]
async fn invalid_json_text_is_a_processing_failure() {
    let result = process(json!("{not json"), transformation("Minify")).await;
    assert!(!result.is_success());
    assert_eq!(result.details()["error_codes"], json!(["PROCESSING_ERROR"]));
}

#[tokio::test]
async fn unknown_transformation_is_a_parameter_failure() {
    let result = process(json!({}), transformation("Shuffle")).await;
    assert_eq!(result.details()["error_codes"], json!(["PARAMETER_ERROR"]));
    assert!(result.error_message().unwrap().contains("Shuffle"));
}
