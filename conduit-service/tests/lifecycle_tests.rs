use async_trait::async_trait;
use conduit_model::ServiceStatus;
use conduit_service::{LifecycleHooks, NoHooks, ServiceConfig, ServiceLifecycle};
use conduit_types::{ErrorCode, Failure};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct ScriptedHooks {
    fail_start: AtomicBool,
    panic_stop: AtomicBool,
    starts: AtomicUsize,
}

#[async_trait]
impl LifecycleHooks for ScriptedHooks {
    async fn on_start(&self, _cancel: &CancellationToken) -> conduit_types::Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Failure::of(ErrorCode::LifecycleError, "port in use"));
        }
        Ok(())
    }

    async fn on_stop(&self, _cancel: &CancellationToken) -> conduit_types::Result<()> {
        if self.panic_stop.load(Ordering::SeqCst) {
            panic!("flush failed");
        }
        Ok(())
    }

    fn status_properties(&self) -> HashMap<String, Value> {
        HashMap::from([("starts".to_string(), json!(self.starts.load(Ordering::SeqCst)))])
    }
}

fn plain() -> ServiceLifecycle {
    ServiceLifecycle::new(Arc::new(NoHooks))
}

fn config() -> ServiceConfig {
    ServiceConfig::new("orders-import").with_name("Orders")
}

#[tokio::test]
async fn start_before_initialize_is_invalid() {
    let lifecycle = plain();
    let failure = lifecycle.start(&CancellationToken::new()).await.unwrap_err();
    assert!(failure.has_code(ErrorCode::InvalidOperation));
    assert!(failure.first().message().contains("NotInitialized"));
    assert_eq!(lifecycle.status(), ServiceStatus::NotInitialized);
}

#[tokio::test]
async fn full_cycle_records_timestamps() {
    let lifecycle = plain();
    let cancel = CancellationToken::new();

    lifecycle.initialize(config(), &cancel).await.unwrap();
    assert_eq!(lifecycle.status(), ServiceStatus::Initialized);
    assert!(lifecycle.initialized_at().is_some());
    assert!(lifecycle.started_at().is_none());

    lifecycle.start(&cancel).await.unwrap();
    assert_eq!(lifecycle.status(), ServiceStatus::Running);
    assert!(lifecycle.started_at().is_some());

    lifecycle.stop(&cancel).await.unwrap();
    assert_eq!(lifecycle.status(), ServiceStatus::Stopped);
    assert!(lifecycle.stopped_at().unwrap() >= lifecycle.started_at().unwrap());

    // Re-entry from Stopped.
    lifecycle.start(&cancel).await.unwrap();
    assert_eq!(lifecycle.status(), ServiceStatus::Running);
    assert!(lifecycle.stopped_at().is_none());
}

#[tokio::test]
async fn second_stop_is_invalid() {
    let lifecycle = plain();
    let cancel = CancellationToken::new();
    lifecycle.initialize(config(), &cancel).await.unwrap();
    lifecycle.start(&cancel).await.unwrap();
    lifecycle.stop(&cancel).await.unwrap();

    let failure = lifecycle.stop(&cancel).await.unwrap_err();
    assert!(failure.has_code(ErrorCode::InvalidOperation));
    assert_eq!(failure.first().detail("status"), Some(&json!("Stopped")));
    assert_eq!(lifecycle.status(), ServiceStatus::Stopped);
}

#[tokio::test]
async fn initialize_rejected_while_running() {
    let lifecycle = plain();
    let cancel = CancellationToken::new();
    lifecycle.initialize(config(), &cancel).await.unwrap();
    lifecycle.start(&cancel).await.unwrap();

    let failure = lifecycle.initialize(config(), &cancel).await.unwrap_err();
    assert!(failure.has_code(ErrorCode::InvalidOperation));
    assert_eq!(lifecycle.status(), ServiceStatus::Running);
}

#[tokio::test]
async fn blank_service_id_is_a_parameter_error() {
    let lifecycle = plain();
    let failure = lifecycle
        .initialize(ServiceConfig::new(""), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(failure.has_code(ErrorCode::ParameterError));
    assert_eq!(lifecycle.status(), ServiceStatus::NotInitialized);
}

#[tokio::test]
async fn failing_hook_moves_to_error_until_reinitialized() {
    let hooks = Arc::new(ScriptedHooks::default());
    hooks.fail_start.store(true, Ordering::SeqCst);
    let lifecycle = ServiceLifecycle::new(hooks.clone());
    let cancel = CancellationToken::new();

    lifecycle.initialize(config(), &cancel).await.unwrap();
    let failure = lifecycle.start(&cancel).await.unwrap_err();
    assert_eq!(failure.first().message(), "port in use");

    let info = lifecycle.status_info();
    assert_eq!(info.status(), ServiceStatus::Error);
    assert_eq!(info.error_message(), Some("port in use"));

    // Error is absorbing for start/stop.
    assert!(lifecycle.start(&cancel).await.is_err());
    assert!(lifecycle.stop(&cancel).await.is_err());

    hooks.fail_start.store(false, Ordering::SeqCst);
    lifecycle.initialize(config(), &cancel).await.unwrap();
    assert_eq!(lifecycle.status_info().error_message(), None);
    lifecycle.start(&cancel).await.unwrap();
    assert_eq!(lifecycle.status(), ServiceStatus::Running);
}

#[tokio::test]
async fn panicking_stop_hook_is_contained() {
    let hooks = Arc::new(ScriptedHooks::default());
    hooks.panic_stop.store(true, Ordering::SeqCst);
    let lifecycle = ServiceLifecycle::new(hooks);
    let cancel = CancellationToken::new();
    lifecycle.initialize(config(), &cancel).await.unwrap();
    lifecycle.start(&cancel).await.unwrap();

    let failure = lifecycle.stop(&cancel).await.unwrap_err();
    assert!(failure.has_code(ErrorCode::LifecycleError));
    assert_eq!(lifecycle.status(), ServiceStatus::Error);
    assert_eq!(lifecycle.status_info().error_message(), Some("flush failed"));
}

#[tokio::test]
async fn status_info_merges_hook_properties() {
    let lifecycle = ServiceLifecycle::new(Arc::new(ScriptedHooks::default()));
    let cancel = CancellationToken::new();

    let before = lifecycle.status_info();
    assert_eq!(before.status(), ServiceStatus::NotInitialized);
    assert_eq!(before.property("service_id"), None);

    lifecycle.initialize(config(), &cancel).await.unwrap();
    lifecycle.start(&cancel).await.unwrap();
    let info = lifecycle.status_info();
    assert_eq!(info.property("service_id"), Some(&json!("orders-import")));
    assert_eq!(info.property("starts"), Some(&json!(1)));
    assert!(info.property("started_at").is_some());
    assert!(info.property("stopped_at").is_none());
    assert_eq!(lifecycle.config().unwrap().display_name(), "Orders");
}

#[tokio::test]
async fn concurrent_starts_yield_one_transition() {
    let hooks = Arc::new(ScriptedHooks::default());
    let lifecycle = Arc::new(ServiceLifecycle::new(hooks.clone()));
    let cancel = CancellationToken::new();
    lifecycle.initialize(config(), &cancel).await.unwrap();

    let (a, b) = tokio::join!(lifecycle.start(&cancel), lifecycle.start(&cancel));
    assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);
    assert_eq!(hooks.starts.load(Ordering::SeqCst), 1);
    assert_eq!(lifecycle.status(), ServiceStatus::Running);
}
