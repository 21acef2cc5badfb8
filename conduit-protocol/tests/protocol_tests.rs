mod common;

use common::{Behaviour, RecordingProtocol, ready_runtime, valid_parameters};
use conduit_protocol::{ProtocolExecutionContext, ProtocolRuntime, validate_parameters};
use conduit_types::{ErrorCode, ParameterMap};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

// ── Initialize ──────────────────────────────────────────────────

#[tokio::test]
async fn initialize_rejects_null_parameters() {
    let protocol = RecordingProtocol::new(Behaviour::Echo);
    let runtime = ProtocolRuntime::new(protocol.clone());

    let failure = runtime
        .initialize(None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(failure.has_code(ErrorCode::ParameterError));
    assert!(!runtime.is_initialized());
    assert_eq!(protocol.init_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn initialize_reports_every_missing_parameter() {
    let runtime = ProtocolRuntime::new(RecordingProtocol::new(Behaviour::Echo));
    let failure = runtime
        .initialize(Some(ParameterMap::new()), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.len(), 2);
    assert!(failure.errors().iter().all(|e| e.has_code(ErrorCode::ParameterError)));
    let properties: Vec<_> = failure
        .errors()
        .iter()
        .filter_map(|e| e.detail("property").and_then(Value::as_str))
        .collect();
    assert_eq!(properties, vec!["Endpoint", "Port"]);
    assert!(!runtime.is_initialized());
}

#[tokio::test]
async fn initialize_treats_null_as_missing() {
    let runtime = ProtocolRuntime::new(RecordingProtocol::new(Behaviour::Echo));
    let params = ParameterMap::new().with("Endpoint", Value::Null).with("Port", 1);
    let failure = runtime
        .initialize(Some(params), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(failure.len(), 1);
}

#[tokio::test]
async fn initialize_snapshots_parameters_with_defaults() {
    let runtime = ready_runtime(RecordingProtocol::new(Behaviour::Echo)).await;
    assert!(runtime.is_initialized());
    let snapshot = runtime.parameters().unwrap();
    assert_eq!(snapshot.get_str("Endpoint"), Some("localhost"));
    assert_eq!(snapshot.get_str("Mode"), Some("fast"));
}

#[tokio::test]
async fn initialize_hook_failure_leaves_protocol_not_ready() {
    let protocol = RecordingProtocol::failing_initialize();
    let runtime = ProtocolRuntime::new(protocol);
    let failure = runtime
        .initialize(Some(valid_parameters()), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(failure.has_code(ErrorCode::InitializationError));
    assert!(!runtime.is_initialized());
    assert!(runtime.parameters().is_none());
}

#[tokio::test]
async fn descriptor_reports_identity() {
    let runtime = ProtocolRuntime::new(RecordingProtocol::new(Behaviour::Echo));
    let descriptor = runtime.descriptor();
    assert_eq!(descriptor.id, "recording");
    assert_eq!(descriptor.version, "2.0");
    assert_eq!(runtime.declared_parameters().len(), 3);
}

// ── Execute ─────────────────────────────────────────────────────

#[tokio::test]
async fn execute_before_initialize_fails_not_initialized() {
    let protocol = RecordingProtocol::new(Behaviour::Echo);
    let runtime = ProtocolRuntime::new(protocol.clone());
    let cancel = CancellationToken::new();

    let mut context = ProtocolExecutionContext::new(Some(json!("x")));
    let with_context = runtime.execute(Some(&mut context), &cancel).await.unwrap_err();
    let without_context = runtime.execute(None, &cancel).await.unwrap_err();

    assert!(with_context.has_code(ErrorCode::NotInitialized));
    assert!(without_context.has_code(ErrorCode::NotInitialized));
    assert_eq!(protocol.execute_calls(), 0);
}

#[tokio::test]
async fn execute_without_context_never_runs_hook() {
    let protocol = RecordingProtocol::new(Behaviour::Echo);
    let runtime = ready_runtime(protocol.clone()).await;

    let failure = runtime
        .execute(None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(failure.has_code(ErrorCode::ExecutionError));
    assert_eq!(protocol.execute_calls(), 0);
}

#[tokio::test]
async fn execute_success_stamps_end_time() {
    let runtime = ready_runtime(RecordingProtocol::new(Behaviour::Echo)).await;
    let mut context = ProtocolExecutionContext::new(Some(json!("payload")));

    let value = runtime
        .execute(Some(&mut context), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(value, json!({"input": "payload", "mode": "fast"}));
    assert!(context.end_time().is_some());
    assert!(context.end_time().unwrap() >= context.start_time());
}

#[tokio::test]
async fn execute_failure_is_propagated_unchanged_and_stamped() {
    let runtime = ready_runtime(RecordingProtocol::new(Behaviour::Fail)).await;
    let mut context = ProtocolExecutionContext::new(None);

    let failure = runtime
        .execute(Some(&mut context), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(failure.len(), 1);
    assert_eq!(failure.first().message(), "remote refused");
    assert!(context.is_completed());
}

#[tokio::test]
async fn execute_panic_becomes_failure() {
    let runtime = ready_runtime(RecordingProtocol::new(Behaviour::Panic)).await;
    let mut context = ProtocolExecutionContext::new(None);

    let failure = runtime
        .execute(Some(&mut context), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(failure.has_code(ErrorCode::ExecutionError));
    assert!(failure.first().message().contains("socket exploded"));
    assert!(context.is_completed());
}

#[tokio::test]
async fn reinitialize_with_bad_parameters_clears_ready_flag() {
    let runtime = ready_runtime(RecordingProtocol::new(Behaviour::Echo)).await;
    assert!(runtime.is_initialized());
    let _ = runtime
        .initialize(Some(ParameterMap::new()), &CancellationToken::new())
        .await;
    assert!(!runtime.is_initialized());
}

// ── Context ─────────────────────────────────────────────────────

#[test]
fn context_end_time_set_at_most_once() {
    let mut context = ProtocolExecutionContext::new(None);
    assert!(context.complete());
    let first = context.end_time();
    assert!(!context.complete());
    assert_eq!(context.end_time(), first);
}

#[test]
fn context_ids_are_unique_and_state_is_mutable() {
    let mut a = ProtocolExecutionContext::new(None)
        .with_parameters(ParameterMap::new().with("k", "v"));
    let b = ProtocolExecutionContext::new(None);
    assert_ne!(a.id(), b.id());
    a.set_state("attempt", 1);
    assert_eq!(a.get_state("attempt"), Some(&json!(1)));
    assert_eq!(a.parameters().get_str("k"), Some("v"));
}

// ── Parameter validation property ───────────────────────────────

proptest! {
    #[test]
    fn missing_required_parameters_are_all_reported(
        present in proptest::collection::vec(any::<bool>(), 1..12)
    ) {
        use conduit_protocol::{ParameterType, ProtocolParameter};

        let declared: Vec<ProtocolParameter> = (0..present.len())
            .map(|i| ProtocolParameter::required(format!("P{i}"), ParameterType::Any))
            .collect();
        let mut params = ParameterMap::new();
        for (i, is_present) in present.iter().enumerate() {
            if *is_present {
                params.insert(format!("P{i}"), i);
            }
        }
        let missing = present.iter().filter(|p| !**p).count();
        let result = validate_parameters(&declared, &params);
        prop_assert_eq!(result.len(), missing);

        let runtime = ProtocolRuntime::new(std::sync::Arc::new(AnyProtocol(declared)));
        let outcome = tokio_test::block_on(runtime.initialize(Some(params), &CancellationToken::new()));
        if missing == 0 {
            prop_assert!(outcome.is_ok());
        } else {
            prop_assert_eq!(outcome.unwrap_err().len(), missing);
        }
    }
}

struct AnyProtocol(Vec<conduit_protocol::ProtocolParameter>);

#[async_trait::async_trait]
impl conduit_protocol::Protocol for AnyProtocol {
    fn id(&self) -> &str {
        "any"
    }

    fn name(&self) -> &str {
        "Any"
    }

    fn version(&self) -> &str {
        "1"
    }

    fn parameters(&self) -> Vec<conduit_protocol::ProtocolParameter> {
        self.0.clone()
    }

    async fn on_execute(
        &self,
        _context: &mut ProtocolExecutionContext,
        _parameters: &ParameterMap,
        _cancel: &CancellationToken,
    ) -> conduit_types::Result<Value> {
        Ok(Value::Null)
    }
}
