//! A fully resolved invocation.

use std::collections::HashMap;
use std::sync::Arc;

use quill_api::Value;
use quill_rpc_core::ApiMethod;
use quill_rpc_core::RegisteredService;

/// Everything needed to run one method call: the target service, the
/// matched descriptor, and parameters already casted where the
/// signature allowed it.
///
/// Resolution produces these without side effects, so a batch can be
/// fully resolved before anything executes.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub service_name: String,
    pub service: Arc<RegisteredService>,
    pub method: Arc<ApiMethod>,
    pub params: Vec<Value>,
    pub named_params: HashMap<String, Value>,
}
