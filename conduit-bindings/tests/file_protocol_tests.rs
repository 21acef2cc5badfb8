use conduit_bindings::{FileProtocol, FileProtocolHandler};
use conduit_protocol::{HandlerRegistry, ProtocolExecutionContext, ProtocolRuntime};
use conduit_types::{ErrorCode, ParameterMap};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn ready(base: &Path) -> ProtocolRuntime {
    let runtime = ProtocolRuntime::new(Arc::new(FileProtocol::new()));
    runtime
        .initialize(
            Some(ParameterMap::new().with("BasePath", base.to_string_lossy().into_owned())),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    runtime
}

async fn run(runtime: &ProtocolRuntime, request: Value) -> conduit_types::Result<Value> {
    let mut context = ProtocolExecutionContext::new(Some(request));
    runtime.execute(Some(&mut context), &CancellationToken::new()).await
}

#[tokio::test]
async fn descriptor_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = ready(dir.path()).await;
    let descriptor = runtime.descriptor();
    assert_eq!((descriptor.id.as_str(), descriptor.version.as_str()), ("file", "1.0"));
    assert_eq!(runtime.parameters().unwrap().get_str("Encoding"), Some("utf-8"));
}

#[tokio::test]
async fn initialize_validates_base_path() {
    let runtime = ProtocolRuntime::new(Arc::new(FileProtocol::new()));
    let cancel = CancellationToken::new();

    let missing = runtime.initialize(Some(ParameterMap::new()), &cancel).await.unwrap_err();
    assert!(missing.has_code(ErrorCode::ParameterError));

    let bad_encoding = ParameterMap::new().with("BasePath", "/tmp").with("Encoding", "latin1");
    assert_eq!(runtime.initialize(Some(bad_encoding), &cancel).await.unwrap_err().len(), 1);

    let absent = ParameterMap::new().with("BasePath", "/definitely/not/here");
    let failure = runtime.initialize(Some(absent), &cancel).await.unwrap_err();
    assert!(failure.has_code(ErrorCode::InitializationError));
    assert!(!runtime.is_initialized());
}

#[tokio::test]
async fn write_append_read_list() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = ready(dir.path()).await;

    let written = run(&runtime, json!({"operation": "write", "path": "log.txt", "content": "one"}))
        .await
        .unwrap();
    assert_eq!(written, json!({"bytes_written": 3}));
    run(&runtime, json!({"operation": "append", "path": "log.txt", "content": "two"}))
        .await
        .unwrap();
    std::fs::write(dir.path().join("a.txt"), "").unwrap();

    let read = run(&runtime, json!({"operation": "read", "path": "log.txt"})).await.unwrap();
    assert_eq!(read, json!("onetwo"));
    let listed = run(&runtime, json!({"operation": "list"})).await.unwrap();
    assert_eq!(listed, json!(["a.txt", "log.txt"]));
}

#[tokio::test]
async fn rejects_escaping_and_malformed_requests() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = ready(dir.path()).await;

    let escape = run(&runtime, json!({"operation": "read", "path": "../secret"})).await.unwrap_err();
    assert!(escape.has_code(ErrorCode::ExecutionError));

    let malformed = run(&runtime, json!({"operation": "delete"})).await.unwrap_err();
    assert!(malformed.first().message().contains("invalid file request"));

    let missing = run(&runtime, json!({"operation": "read", "path": "nope.txt"})).await.unwrap_err();
    assert!(missing.first().message().contains("nope.txt"));
}

#[tokio::test]
async fn handler_dispatches_file_operations() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("x.txt"), "via handler").unwrap();
    let runtime = ready(dir.path()).await;

    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(FileProtocolHandler::new()));
    assert_eq!(registry.supported_protocols(), vec!["file"]);

    let mut context = ProtocolExecutionContext::new(Some(json!({"operation": "read", "path": "x.txt"})));
    let value = registry
        .dispatch(&runtime, &mut context, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(value, json!("via handler"));
    assert!(context.is_completed());
    assert_eq!(context.get_state("operation"), Some(&json!("read")));
}
