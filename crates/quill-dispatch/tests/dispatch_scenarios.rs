//! End-to-end dispatch scenarios over the XML-RPC wire.
//!
//! Every test drives the dispatcher the way a host would: request
//! bytes in, response bytes out, with the codec on both ends.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::bail;

use quill_api::Fault;
use quill_api::ScalarKind;
use quill_api::SignatureEntry;
use quill_api::StructValue;
use quill_api::Value;
use quill_dispatch::Dispatcher;
use quill_dispatch::DispatcherConfig;
use quill_rpc_core::ApiDefinition;
use quill_rpc_core::ApiMethod;
use quill_rpc_core::Decision;
use quill_rpc_core::HookFilter;
use quill_rpc_core::HookKind;
use quill_rpc_core::InterceptorChain;
use quill_rpc_core::RegisteredService;
use quill_rpc_core::ServiceBinding;
use quill_rpc_core::ServiceRegistry;
use quill_xmlrpc::encode_method_call;
use quill_xmlrpc::parse_method_response;
use quill_xmlrpc::MethodResponse;
use quill_xmlrpc::XmlRpcCodec;

// ============================================================================
// Fixtures
// ============================================================================

fn int_param(value: &Value) -> anyhow::Result<i64> {
    match value.as_i64() {
        Some(n) => Ok(n),
        None => bail!("expected an integer, got {}", value.type_name()),
    }
}

fn calculator_api() -> ApiDefinition {
    ApiDefinition::new("Calculator")
        .method(
            ApiMethod::new("add")
                .expects("a", SignatureEntry::scalar(ScalarKind::Int))
                .expects("b", SignatureEntry::scalar(ScalarKind::Int))
                .returns(SignatureEntry::scalar(ScalarKind::Int)),
        )
        .method(
            ApiMethod::aliased("wide", "wide_impl").returns(SignatureEntry::scalar(ScalarKind::Int)),
        )
        .method(ApiMethod::new("reset"))
        .method(ApiMethod::new("noisy"))
        .method(ApiMethod::new("boom"))
}

fn calculator_binding() -> ServiceBinding {
    ServiceBinding::new()
        .with("add", |params: Vec<Value>| async move {
            let a = int_param(&params[0])?;
            let b = int_param(&params[1])?;
            Ok(Some(Value::Int(a + b)))
        })
        .with("wide_impl", |_params: Vec<Value>| async move {
            Ok(Some(Value::String("nope".into())))
        })
        .with("reset", |params: Vec<Value>| async move {
            if !params.is_empty() {
                bail!("reset takes no parameters");
            }
            Ok(None)
        })
        .with("noisy", |_params: Vec<Value>| async move {
            // Declared void; whatever comes back should be dropped.
            Ok(Some(Value::Int(42)))
        })
        .with("boom", |_params: Vec<Value>| async move { bail!("kaboom") })
}

fn calculator_service() -> RegisteredService {
    RegisteredService::new("calc", calculator_api(), calculator_binding())
}

fn dispatcher_with(service: RegisteredService, config: DispatcherConfig) -> Dispatcher {
    let registry = ServiceRegistry::new().with(service);
    Dispatcher::new(Arc::new(registry), Arc::new(XmlRpcCodec::new()), config)
}

fn call(method: &str, params: &[Value]) -> Vec<u8> {
    encode_method_call(method, params).expect("encode call").into_bytes()
}

fn response(bytes: &[u8]) -> MethodResponse {
    parse_method_response(std::str::from_utf8(bytes).expect("utf-8")).expect("parse response")
}

fn success(bytes: &[u8]) -> Value {
    match response(bytes) {
        MethodResponse::Success(value) => value,
        other => panic!("expected success, got {other:?}"),
    }
}

fn fault(bytes: &[u8]) -> Fault {
    match response(bytes) {
        MethodResponse::Fault(fault) => fault,
        other => panic!("expected fault, got {other:?}"),
    }
}

fn multicall_entry(name: &str, params: Vec<Value>) -> Value {
    Value::Struct(
        StructValue::new()
            .with("methodName", Value::String(name.into()))
            .with("params", Value::Array(params)),
    )
}

fn multicall_entries(bytes: &[u8]) -> Vec<Value> {
    match success(bytes) {
        Value::Array(entries) => entries,
        other => panic!("expected multicall array, got {other:?}"),
    }
}

// ============================================================================
// Single-call dispatch
// ============================================================================

#[tokio::test]
async fn add_returns_the_sum() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let body = dispatcher.handle_request(&call("add", &[Value::Int(2), Value::Int(3)])).await;
    assert_eq!(success(&body), Value::Int(5));
}

#[tokio::test]
async fn unknown_method_faults() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let body = dispatcher.handle_request(&call("subtract", &[Value::Int(5), Value::Int(2)])).await;
    let fault = fault(&body);
    assert_eq!(fault.code, 1);
    assert_eq!(fault.message, "no such method 'subtract'");
}

#[tokio::test]
async fn string_params_cast_to_declared_ints() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let body = dispatcher
        .handle_request(&call("add", &[Value::String("2".into()), Value::String("3".into())]))
        .await;
    assert_eq!(success(&body), Value::Int(5));
}

#[tokio::test]
async fn uncastable_params_reach_the_method_raw() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let body = dispatcher
        .handle_request(&call("add", &[Value::String("x".into()), Value::Int(3)]))
        .await;
    // The cast failure did not fault the request; the method saw the raw
    // string and failed on its own terms.
    let fault = fault(&body);
    assert_eq!(fault.code, 3);
    assert!(fault.message.contains("method 'add' failed"));
    assert!(fault.message.contains("expected an integer"));
}

#[tokio::test]
async fn void_return_encodes_boolean_true() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let body = dispatcher.handle_request(&call("reset", &[])).await;
    assert_eq!(success(&body), Value::Bool(true));
}

#[tokio::test]
async fn zero_arity_method_drops_supplied_params() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let body = dispatcher.handle_request(&call("reset", &[Value::Int(1), Value::Int(2)])).await;
    assert_eq!(success(&body), Value::Bool(true));
}

#[tokio::test]
async fn declared_void_drops_a_produced_value() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let body = dispatcher.handle_request(&call("noisy", &[])).await;
    assert_eq!(success(&body), Value::Bool(true));
}

#[tokio::test]
async fn return_value_that_defies_its_signature_faults() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let body = dispatcher.handle_request(&call("wide", &[])).await;
    let fault = fault(&body);
    assert_eq!(fault.code, 3);
    assert!(fault.message.contains("cannot cast return value of 'wide'"));
}

#[tokio::test]
async fn malformed_request_body_faults() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let body = dispatcher.handle_request(b"<methodCall><methodName>add").await;
    assert_eq!(fault(&body).code, 1);
}

#[tokio::test]
async fn oversized_request_faults() {
    let registry = ServiceRegistry::new().with(calculator_service());
    let codec = XmlRpcCodec::new().with_max_request_size(32);
    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        Arc::new(codec),
        DispatcherConfig::delegated("calc"),
    );
    let body = dispatcher.handle_request(&call("add", &[Value::Int(2), Value::Int(3)])).await;
    let fault = fault(&body);
    assert_eq!(fault.code, 1);
    assert!(fault.message.contains("exceeds"));
}

// ============================================================================
// Routing modes
// ============================================================================

#[tokio::test]
async fn layered_mode_splits_the_service_prefix() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::layered());
    let body = dispatcher.handle_request(&call("calc.add", &[Value::Int(2), Value::Int(3)])).await;
    assert_eq!(success(&body), Value::Int(5));

    let body = dispatcher.handle_request(&call("add", &[Value::Int(2), Value::Int(3)])).await;
    assert_eq!(fault(&body).message, "no such method 'add'");

    let body = dispatcher.handle_request(&call("other.add", &[Value::Int(2), Value::Int(3)])).await;
    assert_eq!(fault(&body).message, "no service available for request 'other'");
}

#[tokio::test]
async fn explicit_service_overrides_routing() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::layered());
    let body = dispatcher
        .handle_service_request("calc", &call("add", &[Value::Int(2), Value::Int(3)]))
        .await;
    assert_eq!(success(&body), Value::Int(5));
}

#[tokio::test]
async fn delegated_without_a_default_service_faults() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::default());
    let body = dispatcher.handle_request(&call("add", &[Value::Int(2), Value::Int(3)])).await;
    assert_eq!(fault(&body).message, "no service available for request 'default'");
}

#[tokio::test]
async fn default_method_receives_raw_params_and_reports_its_result() {
    let api = ApiDefinition::new("Echo")
        .method(ApiMethod::new("known").returns(SignatureEntry::scalar(ScalarKind::String)))
        .with_default_method("fallback");
    let binding = ServiceBinding::new()
        .with("known", |_params: Vec<Value>| async move {
            Ok(Some(Value::String("known".into())))
        })
        .with("fallback", |params: Vec<Value>| async move {
            Ok(Some(Value::String(format!("fallback got {} params", params.len()))))
        });
    let dispatcher = dispatcher_with(
        RegisteredService::new("echo", api, binding),
        DispatcherConfig::delegated("echo"),
    );

    let body = dispatcher
        .handle_request(&call("mystery", &[Value::Int(1), Value::String("two".into())]))
        .await;
    assert_eq!(success(&body), Value::String("fallback got 2 params".into()));
}

// ============================================================================
// Interceptors
// ============================================================================

fn canceling_chain(reason: &str) -> InterceptorChain {
    let reason = reason.to_string();
    InterceptorChain::new().with_before(
        HookKind::function(move |_ctx| {
            let reason = reason.clone();
            async move { Decision::cancel(reason) }
        }),
        HookFilter::any(),
    )
}

#[tokio::test]
async fn before_hook_veto_with_reason_faults() {
    let service = calculator_service().with_interceptors(canceling_chain("invalid login"));
    let dispatcher = dispatcher_with(service, DispatcherConfig::delegated("calc"));
    let body = dispatcher.handle_request(&call("add", &[Value::Int(2), Value::Int(3)])).await;
    let fault = fault(&body);
    assert_eq!(fault.code, 1);
    assert_eq!(fault.message, "request canceled: invalid login");
}

#[tokio::test]
async fn direct_mode_never_runs_hooks() {
    let service = calculator_service().with_interceptors(canceling_chain("invalid login"));
    let dispatcher = dispatcher_with(service, DispatcherConfig::direct("calc"));
    let body = dispatcher.handle_request(&call("add", &[Value::Int(2), Value::Int(3)])).await;
    assert_eq!(success(&body), Value::Int(5));
}

#[tokio::test]
async fn silent_cancel_is_an_empty_success() {
    let ran = Arc::new(AtomicBool::new(false));
    let after_calls = Arc::new(AtomicUsize::new(0));

    let ran_probe = Arc::clone(&ran);
    let binding = ServiceBinding::new().with("probe", move |_params: Vec<Value>| {
        let ran = Arc::clone(&ran_probe);
        async move {
            ran.store(true, Ordering::SeqCst);
            Ok(Some(Value::Int(1)))
        }
    });
    let api = ApiDefinition::new("Probe")
        .method(ApiMethod::new("probe").returns(SignatureEntry::scalar(ScalarKind::Int)));

    let after_counter = Arc::clone(&after_calls);
    let chain = InterceptorChain::new()
        .with_before(
            HookKind::function(|_ctx| async { Decision::cancel_silently() }),
            HookFilter::any(),
        )
        .with_after(
            HookKind::function(move |_ctx| {
                let after_calls = Arc::clone(&after_counter);
                async move {
                    after_calls.fetch_add(1, Ordering::SeqCst);
                    Decision::Proceed
                }
            }),
            HookFilter::any(),
        );

    let service = RegisteredService::new("probe", api, binding).with_interceptors(chain);
    let dispatcher = dispatcher_with(service, DispatcherConfig::delegated("probe"));

    let body = dispatcher.handle_request(&call("probe", &[])).await;
    // The caller sees an ordinary empty success and never learns the
    // invocation was suppressed.
    assert_eq!(success(&body), Value::Bool(true));
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn after_hook_observes_the_casted_result() {
    let seen = Arc::new(Mutex::new(None));
    let seen_hook = Arc::clone(&seen);
    let chain = InterceptorChain::new().with_after(
        HookKind::function(move |ctx| {
            let seen = Arc::clone(&seen_hook);
            let result = ctx.result.clone();
            async move {
                *seen.lock().expect("lock") = result;
                Decision::Proceed
            }
        }),
        HookFilter::any(),
    );
    let service = calculator_service().with_interceptors(chain);
    let dispatcher = dispatcher_with(service, DispatcherConfig::delegated("calc"));

    let body = dispatcher
        .handle_request(&call("add", &[Value::String("2".into()), Value::Int(3)]))
        .await;
    assert_eq!(success(&body), Value::Int(5));
    assert_eq!(*seen.lock().expect("lock"), Some(Value::Int(5)));
}

#[tokio::test]
async fn hook_filter_scopes_the_veto() {
    let chain = InterceptorChain::new().with_before(
        HookKind::function(|_ctx| async { Decision::cancel("invalid login") }),
        HookFilter::except(["reset"]),
    );
    let service = calculator_service().with_interceptors(chain);
    let dispatcher = dispatcher_with(service, DispatcherConfig::delegated("calc"));

    let body = dispatcher.handle_request(&call("reset", &[])).await;
    assert_eq!(success(&body), Value::Bool(true));

    let body = dispatcher.handle_request(&call("add", &[Value::Int(2), Value::Int(3)])).await;
    assert_eq!(fault(&body).message, "request canceled: invalid login");
}

// ============================================================================
// Multicall
// ============================================================================

#[tokio::test]
async fn multicall_isolates_entry_failures() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let batch = Value::Array(vec![
        multicall_entry("add", vec![Value::Int(2), Value::Int(3)]),
        multicall_entry("subtract", vec![Value::Int(9), Value::Int(4)]),
        multicall_entry("boom", vec![]),
        multicall_entry("add", vec![Value::Int(10), Value::Int(20)]),
    ]);
    let body = dispatcher.handle_request(&call("system.multicall", &[batch])).await;
    let entries = multicall_entries(&body);
    assert_eq!(entries.len(), 4);

    assert_eq!(entries[0], Value::Array(vec![Value::Int(5)]));

    let resolution = entries[1].as_struct().expect("fault struct");
    assert_eq!(resolution.get("faultCode"), Some(&Value::Int(4)));
    assert_eq!(
        resolution.get("faultMessage").and_then(Value::as_str),
        Some("no such method 'subtract'")
    );
    assert!(resolution.get("faultString").is_none());

    let execution = entries[2].as_struct().expect("fault struct");
    assert_eq!(execution.get("faultCode"), Some(&Value::Int(3)));
    let fault_string = execution.get("faultString").and_then(Value::as_str).expect("faultString");
    assert!(fault_string.contains("kaboom"));
    assert!(execution.get("faultMessage").is_none());

    assert_eq!(entries[3], Value::Array(vec![Value::Int(30)]));
}

#[tokio::test]
async fn multicall_void_entry_reports_boolean_true() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let entry = Value::Struct(StructValue::new().with("methodName", Value::String("reset".into())));
    let body = dispatcher
        .handle_request(&call("system.multicall", &[Value::Array(vec![entry])]))
        .await;
    let entries = multicall_entries(&body);
    assert_eq!(entries[0], Value::Array(vec![Value::Bool(true)]));
}

#[tokio::test]
async fn nested_multicall_entry_faults_in_place() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let batch = Value::Array(vec![
        multicall_entry("system.multicall", vec![Value::Array(vec![])]),
        multicall_entry("add", vec![Value::Int(2), Value::Int(3)]),
    ]);
    let body = dispatcher.handle_request(&call("system.multicall", &[batch])).await;
    let entries = multicall_entries(&body);

    let nested = entries[0].as_struct().expect("fault struct");
    assert_eq!(nested.get("faultCode"), Some(&Value::Int(4)));
    assert_eq!(
        nested.get("faultMessage").and_then(Value::as_str),
        Some("recursive multicall is not allowed")
    );
    assert_eq!(entries[1], Value::Array(vec![Value::Int(5)]));
}

#[tokio::test]
async fn multicall_entry_that_is_not_a_struct_faults_in_place() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let batch = Value::Array(vec![Value::Int(1)]);
    let body = dispatcher.handle_request(&call("system.multicall", &[batch])).await;
    let entries = multicall_entries(&body);

    let malformed = entries[0].as_struct().expect("fault struct");
    assert_eq!(malformed.get("faultCode"), Some(&Value::Int(4)));
    assert!(malformed
        .get("faultMessage")
        .and_then(Value::as_str)
        .expect("faultMessage")
        .contains("not a struct"));
}

#[tokio::test]
async fn malformed_multicall_payload_faults_the_whole_request() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::delegated("calc"));
    let body = dispatcher.handle_request(&call("system.multicall", &[Value::Int(3)])).await;
    let fault = fault(&body);
    assert_eq!(fault.code, 1);
    assert!(fault.message.contains("malformed multicall"));
}

#[tokio::test]
async fn multicall_is_recognized_before_the_layered_split() {
    let dispatcher = dispatcher_with(calculator_service(), DispatcherConfig::layered());
    let batch = Value::Array(vec![multicall_entry("calc.add", vec![Value::Int(2), Value::Int(3)])]);
    let body = dispatcher.handle_request(&call("system.multicall", &[batch])).await;
    let entries = multicall_entries(&body);
    assert_eq!(entries[0], Value::Array(vec![Value::Int(5)]));
}

#[tokio::test]
async fn multicall_entries_still_pass_through_hooks() {
    let chain = InterceptorChain::new().with_before(
        HookKind::function(|_ctx| async { Decision::cancel("invalid login") }),
        HookFilter::only(["add"]),
    );
    let service = calculator_service().with_interceptors(chain);
    let dispatcher = dispatcher_with(service, DispatcherConfig::delegated("calc"));

    let batch = Value::Array(vec![
        multicall_entry("add", vec![Value::Int(2), Value::Int(3)]),
        multicall_entry("reset", vec![]),
    ]);
    let body = dispatcher.handle_request(&call("system.multicall", &[batch])).await;
    let entries = multicall_entries(&body);

    let vetoed = entries[0].as_struct().expect("fault struct");
    assert_eq!(vetoed.get("faultCode"), Some(&Value::Int(3)));
    assert_eq!(
        vetoed.get("faultString").and_then(Value::as_str),
        Some("request canceled: invalid login")
    );
    assert_eq!(entries[1], Value::Array(vec![Value::Bool(true)]));
}
