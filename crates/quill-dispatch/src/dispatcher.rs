//! The request dispatcher.
//!
//! One [`Dispatcher`] owns a service registry, a wire codec, and the
//! routing configuration. [`Dispatcher::handle_request`] is total:
//! every inbound body produces response bytes, with failures encoded
//! as protocol faults rather than surfaced to the host.

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use quill_api::cast_expects;
use quill_api::cast_returns;
use quill_api::Fault;
use quill_api::Value;
use quill_api::FAULT_CODE_EXECUTION;
use quill_rpc_core::ApiMethod;
use quill_rpc_core::DecodedRequest;
use quill_rpc_core::Decision;
use quill_rpc_core::DispatcherError;
use quill_rpc_core::HookContext;
use quill_rpc_core::ServiceRegistry;
use quill_rpc_core::WireProtocol;

use crate::config::DispatchMode;
use crate::config::DispatcherConfig;
use crate::invocation::Invocation;
use crate::multicall;
use crate::multicall::SYSTEM_MULTICALL;

/// Dispatches decoded requests against registered services.
///
/// Shared state is read-only after construction, so one instance can
/// serve any number of concurrent requests behind an `Arc`.
pub struct Dispatcher {
    registry: Arc<ServiceRegistry>,
    protocol: Arc<dyn WireProtocol>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        protocol: Arc<dyn WireProtocol>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            registry,
            protocol,
            config,
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn mode(&self) -> DispatchMode {
        self.config.mode
    }

    /// Handle one request body end to end, routing by the configured
    /// mode. Always produces response bytes.
    pub async fn handle_request(&self, body: &[u8]) -> Vec<u8> {
        self.respond(None, body).await
    }

    /// Handle one request body against a service the host picked, as a
    /// delegated endpoint does. Always produces response bytes.
    pub async fn handle_service_request(&self, service_name: &str, body: &[u8]) -> Vec<u8> {
        self.respond(Some(service_name), body).await
    }

    async fn respond(&self, explicit_service: Option<&str>, body: &[u8]) -> Vec<u8> {
        let decoded = match self.protocol.decode_request(body) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(protocol = self.protocol.name(), error = %err, "failed to decode request");
                return self.protocol.encode_fault(&Fault::request(err.to_string()));
            }
        };
        debug!(
            method = %decoded.method_name,
            params = decoded.params.len(),
            mode = self.config.mode.name(),
            "dispatching request"
        );
        match self.dispatch_decoded(&decoded, explicit_service).await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(method = %decoded.method_name, error = %err, "request failed");
                self.protocol.encode_fault(&fault_from_error(&err))
            }
        }
    }

    async fn dispatch_decoded(
        &self,
        decoded: &DecodedRequest,
        explicit_service: Option<&str>,
    ) -> Result<Vec<u8>, DispatcherError> {
        // Batching is recognized before any mode-specific name handling,
        // so "system.multicall" never reaches the layered name split.
        if decoded.method_name == SYSTEM_MULTICALL {
            let outcomes = multicall::run_multicall(self, explicit_service, &decoded.params).await?;
            return self
                .protocol
                .encode_multicall_response(&outcomes)
                .map_err(|err| DispatcherError::Protocol {
                    message: err.to_string(),
                });
        }

        let invocation = self.resolve(&decoded.method_name, &decoded.params, explicit_service)?;
        let result = self.execute(&invocation).await?;
        debug!(
            response_type = %invocation.method.response_type_name(),
            void = result.is_none(),
            "encoding response"
        );
        self.protocol
            .encode_response(result.as_ref())
            .map_err(|err| DispatcherError::Protocol {
                message: err.to_string(),
            })
    }

    /// Resolve a method name and raw parameters into an [`Invocation`].
    ///
    /// # Errors
    ///
    /// Returns an error if no service matches the routed name, the
    /// method is unknown with no default to fall back on, or the
    /// descriptor names a binding the service never supplied.
    pub(crate) fn resolve(
        &self,
        method_name: &str,
        params: &[Value],
        explicit_service: Option<&str>,
    ) -> Result<Invocation, DispatcherError> {
        let (service_name, public_name) = self.route(method_name, explicit_service)?;
        let service = self
            .registry
            .get(&service_name)
            .ok_or_else(|| DispatcherError::NoServiceFound {
                name: service_name.clone(),
            })?;

        let api = service.api();
        let method = match api.public_api_method_instance(public_name) {
            Some(method) => method,
            None => match api.default_api_method_instance(public_name) {
                Some(method) => method,
                None => {
                    return Err(DispatcherError::NoSuchMethod {
                        name: public_name.to_string(),
                    })
                }
            },
        };

        if !service.binding().contains(method.internal_name()) {
            return Err(DispatcherError::MethodNotBound {
                public_name: method.public_name().to_string(),
                internal_name: method.internal_name().to_string(),
            });
        }

        let params = self.cast_params(&method, params);
        let named_params = method.named_params(&params);
        Ok(Invocation {
            service_name,
            service,
            method,
            params,
            named_params,
        })
    }

    /// Split the wire method name into a service name and a public
    /// method name per the configured mode.
    fn route<'a>(
        &self,
        method_name: &'a str,
        explicit_service: Option<&str>,
    ) -> Result<(String, &'a str), DispatcherError> {
        if let Some(service) = explicit_service {
            return Ok((service.to_string(), method_name));
        }
        match self.config.mode {
            DispatchMode::Direct | DispatchMode::Delegated => {
                match self.config.default_service.as_deref() {
                    Some(service) => Ok((service.to_string(), method_name)),
                    None => Err(DispatcherError::NoServiceFound {
                        name: "default".to_string(),
                    }),
                }
            }
            DispatchMode::Layered => match method_name.split_once('.') {
                Some((service, method)) if !service.is_empty() && !method.is_empty() => {
                    Ok((service.to_string(), method))
                }
                _ => Err(DispatcherError::NoSuchMethod {
                    name: method_name.to_string(),
                }),
            },
        }
    }

    /// Cast parameters against the declared signature.
    ///
    /// Casting is lenient: a failure logs and falls back to the raw
    /// values so the bound method still gets a chance at them. Default
    /// methods have no declared signature and always see raw values.
    fn cast_params(&self, method: &ApiMethod, params: &[Value]) -> Vec<Value> {
        if method.is_default() {
            return params.to_vec();
        }
        match cast_expects(params, method.expects_signature()) {
            Ok(casted) => casted,
            Err(err) => {
                warn!(
                    method = method.public_name(),
                    error = %err,
                    "parameter cast failed, passing raw values through"
                );
                params.to_vec()
            }
        }
    }

    /// Run one resolved invocation: before hooks, the bound method,
    /// return casting, then after hooks.
    ///
    /// A `None` result is a void return. A before hook that cancels
    /// without a reason also yields `Ok(None)`: the caller sees an
    /// empty success and never learns the call was suppressed.
    ///
    /// # Errors
    ///
    /// Returns an error if a before hook vetoes with a reason, the
    /// bound method fails, or the return value does not fit the
    /// declared return signature.
    pub(crate) async fn execute(
        &self,
        invocation: &Invocation,
    ) -> Result<Option<Value>, DispatcherError> {
        let method = invocation.method.as_ref();
        let service = invocation.service.as_ref();
        // Direct mode wires the service straight to the endpoint;
        // interceptors only exist in the delegated and layered modes.
        let run_hooks = self.config.mode != DispatchMode::Direct;

        let ctx = HookContext::new(
            invocation.service_name.clone(),
            method.public_name(),
            invocation.params.clone(),
            invocation.named_params.clone(),
        );

        if run_hooks {
            match service.interceptors().run_before(&ctx).await {
                Decision::Proceed => {}
                Decision::Cancel { reason: Some(reason) } => {
                    return Err(DispatcherError::Canceled { reason });
                }
                Decision::Cancel { reason: None } => return Ok(None),
            }
        }

        let bound = service.binding().get(method.internal_name()).ok_or_else(|| {
            DispatcherError::MethodNotBound {
                public_name: method.public_name().to_string(),
                internal_name: method.internal_name().to_string(),
            }
        })?;
        let raw = bound(invocation.params.clone())
            .await
            .map_err(|err| DispatcherError::Execution {
                method: method.public_name().to_string(),
                message: err.to_string(),
            })?;

        let result = cast_result(method, raw)?;

        if run_hooks {
            let after_ctx = ctx.with_result(result.clone());
            service.interceptors().run_after(&after_ctx).await;
        }
        Ok(result)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("services", &self.registry.len())
            .field("protocol", &self.protocol.name())
            .field("mode", &self.config.mode)
            .finish()
    }
}

/// Cast the raw return value against the declared return signature.
///
/// A declared signature that fails to match propagates the failure; a
/// method declared void drops any value it produced; a default method
/// has no declaration, so its value is cast against a signature
/// inferred from the value itself.
fn cast_result(method: &ApiMethod, raw: Option<Value>) -> Result<Option<Value>, DispatcherError> {
    let Some(value) = raw else {
        return Ok(None);
    };
    if method.returns_signature().is_none() && !method.is_default() {
        return Ok(None);
    }
    cast_returns(&value, method.returns_signature())
        .map(Some)
        .map_err(|source| DispatcherError::ReturnCast {
            method: method.public_name().to_string(),
            source,
        })
}

/// Map a dispatch error onto the fault the caller sees.
fn fault_from_error(err: &DispatcherError) -> Fault {
    match err {
        DispatcherError::Execution { .. } | DispatcherError::ReturnCast { .. } => {
            Fault::new(FAULT_CODE_EXECUTION, err.to_string())
        }
        other => Fault::request(other.to_string()),
    }
}
