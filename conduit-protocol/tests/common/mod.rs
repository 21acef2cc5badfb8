//! Test protocols and handlers shared by the protocol integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use conduit_protocol::{
    ParameterType, Protocol, ProtocolExecutionContext, ProtocolHandler, ProtocolParameter,
    ProtocolRuntime,
};
use conduit_types::{ErrorCode, Failure, ParameterMap};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// What the recording protocol's execute hook should do.
#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    Echo,
    Fail,
    Panic,
}

pub struct RecordingProtocol {
    pub behaviour: Behaviour,
    pub fail_initialize: bool,
    pub init_calls: AtomicUsize,
    pub execute_calls: AtomicUsize,
}

impl RecordingProtocol {
    pub fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            fail_initialize: false,
            init_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
        })
    }

    pub fn failing_initialize() -> Arc<Self> {
        Arc::new(Self {
            behaviour: Behaviour::Echo,
            fail_initialize: true,
            init_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
        })
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Protocol for RecordingProtocol {
    fn id(&self) -> &str {
        "recording"
    }

    fn name(&self) -> &str {
        "Recording Protocol"
    }

    fn version(&self) -> &str {
        "2.0"
    }

    fn parameters(&self) -> Vec<ProtocolParameter> {
        vec![
            ProtocolParameter::required("Endpoint", ParameterType::String),
            ProtocolParameter::required("Port", ParameterType::Integer),
            ProtocolParameter::optional("Mode", ParameterType::String).with_default("fast"),
        ]
    }

    async fn on_initialize(
        &self,
        _parameters: &ParameterMap,
        _cancel: &CancellationToken,
    ) -> conduit_types::Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_initialize {
            return Err(Failure::of(ErrorCode::InitializationError, "endpoint unreachable"));
        }
        Ok(())
    }

    async fn on_execute(
        &self,
        context: &mut ProtocolExecutionContext,
        parameters: &ParameterMap,
        _cancel: &CancellationToken,
    ) -> conduit_types::Result<Value> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Echo => Ok(json!({
                "input": context.input_data().cloned().unwrap_or(Value::Null),
                "mode": parameters.get_str("Mode"),
            })),
            Behaviour::Fail => Err(Failure::of(ErrorCode::ExecutionError, "remote refused")),
            Behaviour::Panic => panic!("socket exploded"),
        }
    }
}

pub fn valid_parameters() -> ParameterMap {
    ParameterMap::new().with("Endpoint", "localhost").with("Port", 8080)
}

pub async fn ready_runtime(protocol: Arc<RecordingProtocol>) -> ProtocolRuntime {
    let runtime = ProtocolRuntime::new(protocol);
    runtime
        .initialize(Some(valid_parameters()), &CancellationToken::new())
        .await
        .expect("initialize");
    runtime
}

pub struct EchoHandler {
    pub id: String,
    pub protocols: Vec<String>,
    pub panics: bool,
}

impl EchoHandler {
    pub fn for_protocols(id: &str, protocols: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            protocols: protocols.iter().map(|p| p.to_string()).collect(),
            panics: false,
        })
    }
}

#[async_trait]
impl ProtocolHandler for EchoHandler {
    fn handler_id(&self) -> &str {
        &self.id
    }

    fn supported_protocols(&self) -> Vec<String> {
        self.protocols.clone()
    }

    async fn on_handle(
        &self,
        protocol: &ProtocolRuntime,
        context: &mut ProtocolExecutionContext,
        cancel: &CancellationToken,
    ) -> conduit_types::Result<Value> {
        if self.panics {
            panic!("handler bug");
        }
        context.set_state("handled_by", self.id.clone());
        protocol.execute(Some(context), cancel).await
    }
}
