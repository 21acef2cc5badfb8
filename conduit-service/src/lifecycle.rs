//! The lifecycle state machine shared by every service kind.
//!
//! A [`ServiceLifecycle`] owns the state, the timestamps and the
//! configuration. Kind-specific behavior is injected through
//! [`LifecycleHooks`]; the bookkeeping around each hook is never skipped.

use crate::config::ServiceConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conduit_model::{ServiceStatus, ServiceStatusInfo};
use conduit_types::boundary::guarded;
use conduit_types::{Error, ErrorCode, Failure, ParameterMap};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Kind-specific setup and teardown. Every hook defaults to a no-op.
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    async fn on_initialize(
        &self,
        config: &ServiceConfig,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<()> {
        let _ = (config, cancel);
        Ok(())
    }

    async fn on_start(&self, cancel: &CancellationToken) -> conduit_types::Result<()> {
        let _ = cancel;
        Ok(())
    }

    async fn on_stop(&self, cancel: &CancellationToken) -> conduit_types::Result<()> {
        let _ = cancel;
        Ok(())
    }

    /// Extra entries for status snapshots.
    fn status_properties(&self) -> HashMap<String, Value> {
        HashMap::new()
    }

    /// Groups of parameter keys that replace each other when call
    /// parameters are layered over the configured settings.
    fn exclusive_parameters(&self) -> &[&[&str]] {
        &[]
    }
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl LifecycleHooks for NoHooks {}

#[derive(Debug, Clone)]
struct LifecycleState {
    status: ServiceStatus,
    last_updated: DateTime<Utc>,
    error_message: Option<String>,
    config: Option<ServiceConfig>,
    initialized_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self {
            status: ServiceStatus::NotInitialized,
            last_updated: Utc::now(),
            error_message: None,
            config: None,
            initialized_at: None,
            started_at: None,
            stopped_at: None,
        }
    }
}

/// Lifecycle state machine around one set of [`LifecycleHooks`].
///
/// Transitions are serialized by an async mutex held across the hook, so
/// concurrent `start`/`stop` callers observe the state machine one
/// transition at a time. Status reads never wait for an in-flight hook.
pub struct ServiceLifecycle {
    hooks: Arc<dyn LifecycleHooks>,
    transition: Mutex<()>,
    state: RwLock<LifecycleState>,
}

impl ServiceLifecycle {
    pub fn new(hooks: Arc<dyn LifecycleHooks>) -> Self {
        Self {
            hooks,
            transition: Mutex::new(()),
            state: RwLock::new(LifecycleState::default()),
        }
    }

    /// Binds `config`, runs the initialize hook and moves to `Initialized`.
    ///
    /// Legal from `NotInitialized`, `Initialized`, `Stopped` and `Error`.
    /// A failing hook moves the service to `Error`.
    pub async fn initialize(
        &self,
        config: ServiceConfig,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<()> {
        let _guard = self.transition.lock().await;
        let service_id = config.service_id.clone();
        let current = self.snapshot().status;
        if !current.can_initialize() {
            warn!(service_id = %service_id, status = %current, "Initialize rejected");
            return Err(invalid_transition("initialize", &service_id, current));
        }
        if let Err(failure) = config.validate().into_result(ErrorCode::ParameterError) {
            warn!(service_id = %service_id, "Service configuration invalid: {}", failure);
            return Err(failure);
        }

        info!(service_id = %service_id, "Initializing service");
        self.update(|s| {
            s.config = Some(config.clone());
            s.initialized_at = Some(Utc::now());
            s.started_at = None;
            s.stopped_at = None;
        });

        let hook = self.hooks.on_initialize(&config, cancel);
        match guarded(ErrorCode::InitializationError, hook).await {
            Ok(()) => {
                self.set_status(ServiceStatus::Initialized);
                info!(service_id = %service_id, "Service initialized");
                Ok(())
            }
            Err(failure) => {
                self.fail(&failure);
                error!(service_id = %service_id, "Service initialization failed: {}", failure);
                Err(failure)
            }
        }
    }

    /// Moves `Initialized`/`Stopped` through `Starting` to `Running`.
    pub async fn start(&self, cancel: &CancellationToken) -> conduit_types::Result<()> {
        let _guard = self.transition.lock().await;
        let service_id = self.service_id().unwrap_or_default();
        let current = self.snapshot().status;
        if !current.can_start() {
            warn!(service_id = %service_id, status = %current, "Start rejected");
            return Err(invalid_transition("start", &service_id, current));
        }

        info!(service_id = %service_id, "Starting service");
        self.update(|s| {
            s.status = ServiceStatus::Starting;
            s.started_at = Some(Utc::now());
            s.stopped_at = None;
        });

        match guarded(ErrorCode::LifecycleError, self.hooks.on_start(cancel)).await {
            Ok(()) => {
                self.set_status(ServiceStatus::Running);
                info!(service_id = %service_id, "Service started");
                Ok(())
            }
            Err(failure) => {
                self.fail(&failure);
                error!(service_id = %service_id, "Service start failed: {}", failure);
                Err(failure)
            }
        }
    }

    /// Moves `Running` through `Stopping` to `Stopped`.
    pub async fn stop(&self, cancel: &CancellationToken) -> conduit_types::Result<()> {
        let _guard = self.transition.lock().await;
        let service_id = self.service_id().unwrap_or_default();
        let current = self.snapshot().status;
        if !current.can_stop() {
            warn!(service_id = %service_id, status = %current, "Stop rejected");
            return Err(invalid_transition("stop", &service_id, current));
        }

        info!(service_id = %service_id, "Stopping service");
        self.set_status(ServiceStatus::Stopping);

        match guarded(ErrorCode::LifecycleError, self.hooks.on_stop(cancel)).await {
            Ok(()) => {
                self.update(|s| {
                    s.status = ServiceStatus::Stopped;
                    s.stopped_at = Some(Utc::now());
                });
                info!(service_id = %service_id, "Service stopped");
                Ok(())
            }
            Err(failure) => {
                self.fail(&failure);
                error!(service_id = %service_id, "Service stop failed: {}", failure);
                Err(failure)
            }
        }
    }

    pub fn status(&self) -> ServiceStatus {
        self.snapshot().status
    }

    /// A fresh snapshot. Has no side effects and is valid in every state.
    pub fn status_info(&self) -> ServiceStatusInfo {
        let state = self.snapshot();
        let mut properties = self.hooks.status_properties();
        if let Some(config) = &state.config {
            properties.insert("service_id".into(), Value::String(config.service_id.clone()));
        }
        let stamps = [
            ("initialized_at", state.initialized_at),
            ("started_at", state.started_at),
            ("stopped_at", state.stopped_at),
        ];
        for (key, stamp) in stamps {
            if let Some(at) = stamp {
                properties.insert(key.into(), Value::String(at.to_rfc3339()));
            }
        }
        ServiceStatusInfo::new(state.status, state.last_updated, state.error_message, properties)
    }

    pub fn service_id(&self) -> Option<String> {
        self.snapshot().config.map(|c| c.service_id)
    }

    pub fn config(&self) -> Option<ServiceConfig> {
        self.snapshot().config
    }

    pub fn initialized_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().initialized_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().started_at
    }

    pub fn stopped_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().stopped_at
    }

    /// Per-call parameters layered over the configured settings.
    pub fn layered_parameters(&self, call: &ParameterMap) -> ParameterMap {
        match self.snapshot().config {
            Some(config) => config.layered(call, self.hooks.exclusive_parameters()),
            None => call.clone(),
        }
    }

    fn snapshot(&self) -> LifecycleState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, apply: impl FnOnce(&mut LifecycleState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
        state.last_updated = Utc::now();
    }

    fn set_status(&self, status: ServiceStatus) {
        self.update(|s| {
            s.status = status;
            s.error_message = None;
        });
    }

    fn fail(&self, failure: &Failure) {
        let message = failure.message();
        self.update(|s| {
            s.status = ServiceStatus::Error;
            s.error_message = Some(message);
        });
    }
}

impl std::fmt::Debug for ServiceLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.snapshot();
        f.debug_struct("ServiceLifecycle")
            .field("status", &state.status)
            .field("service_id", &state.config.map(|c| c.service_id))
            .finish()
    }
}

fn invalid_transition(operation: &str, service_id: &str, current: ServiceStatus) -> Failure {
    let error = Error::from_code(
        ErrorCode::InvalidOperation,
        format!("cannot {operation} service '{service_id}' in state {current}"),
    )
    .with_detail("status", current.to_string());
    Failure::new(error)
}
