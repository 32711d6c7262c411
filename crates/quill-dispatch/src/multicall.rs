//! `system.multicall` batching.
//!
//! Resolution and execution are separate phases. Every entry resolves
//! before anything runs, a sub-call that fails to resolve faults with
//! the resolution shape, one that fails while running faults with the
//! execution shape, and no failure disturbs its siblings.

use tracing::debug;

use quill_api::limits::MAX_MULTICALL_CALLS;
use quill_api::StructValue;
use quill_api::Value;
use quill_api::FAULT_CODE_EXECUTION;
use quill_api::FAULT_CODE_RESOLUTION;
use quill_rpc_core::DispatcherError;
use quill_rpc_core::MulticallOutcome;

use crate::dispatcher::Dispatcher;
use crate::invocation::Invocation;

/// Reserved method name for batched calls.
pub const SYSTEM_MULTICALL: &str = "system.multicall";

/// Run a batch of calls and collect one outcome per entry.
///
/// # Errors
///
/// Returns an error only when the batch itself is unusable: the
/// payload is not a single array of call structs, or it exceeds the
/// batch size bound. Per-entry failures become fault outcomes instead.
pub(crate) async fn run_multicall(
    dispatcher: &Dispatcher,
    explicit_service: Option<&str>,
    params: &[Value],
) -> Result<Vec<MulticallOutcome>, DispatcherError> {
    let calls = match params.first().and_then(Value::as_array) {
        Some(calls) if params.len() == 1 => calls,
        _ => {
            return Err(DispatcherError::MalformedMulticall {
                reason: "expected a single array of call structs".to_string(),
            })
        }
    };
    if calls.len() > MAX_MULTICALL_CALLS {
        return Err(DispatcherError::MalformedMulticall {
            reason: format!("more than {MAX_MULTICALL_CALLS} calls in one batch"),
        });
    }
    debug!(calls = calls.len(), "running multicall batch");

    // Phase 1: resolve every entry before running any of them.
    let resolutions: Vec<Result<Invocation, DispatcherError>> = calls
        .iter()
        .map(|entry| resolve_entry(dispatcher, explicit_service, entry))
        .collect();

    // Phase 2: execute in order. Failures stay local to their entry.
    let mut outcomes = Vec::with_capacity(resolutions.len());
    for resolution in resolutions {
        match resolution {
            Err(err) => outcomes.push(MulticallOutcome::Fault(resolution_fault(&err))),
            Ok(invocation) => match dispatcher.execute(&invocation).await {
                Ok(value) => outcomes.push(MulticallOutcome::Success(value)),
                Err(err) => outcomes.push(MulticallOutcome::Fault(execution_fault(&err))),
            },
        }
    }
    Ok(outcomes)
}

fn resolve_entry(
    dispatcher: &Dispatcher,
    explicit_service: Option<&str>,
    entry: &Value,
) -> Result<Invocation, DispatcherError> {
    let fields = entry
        .as_struct()
        .ok_or_else(|| DispatcherError::MalformedMulticall {
            reason: format!("call entry is a {}, not a struct", entry.type_name()),
        })?;
    let method_name = fields
        .get("methodName")
        .and_then(Value::as_str)
        .ok_or_else(|| DispatcherError::MalformedMulticall {
            reason: "call entry has no methodName string".to_string(),
        })?;
    if method_name == SYSTEM_MULTICALL {
        return Err(DispatcherError::NestedMulticall);
    }
    let params: &[Value] = match fields.get("params") {
        None => &[],
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(DispatcherError::MalformedMulticall {
                reason: format!("call entry params is a {}, not an array", other.type_name()),
            })
        }
    };
    dispatcher.resolve(method_name, params, explicit_service)
}

/// Fault shape for entries that never resolved: `faultCode` 4 with the
/// message under `faultMessage`.
fn resolution_fault(err: &DispatcherError) -> StructValue {
    StructValue::new()
        .with("faultCode", Value::Int(FAULT_CODE_RESOLUTION))
        .with("faultMessage", Value::String(err.to_string()))
}

/// Fault shape for entries that failed while running: `faultCode` 3
/// with the message under `faultString`.
fn execution_fault(err: &DispatcherError) -> StructValue {
    StructValue::new()
        .with("faultCode", Value::Int(FAULT_CODE_EXECUTION))
        .with("faultString", Value::String(err.to_string()))
}
