//! Credential checking as a before-interceptor.
//!
//! Both publishing surfaces carry `username` and `password` somewhere
//! in their positional signatures, so the gate reads them from the
//! named-parameter view instead of hardcoding positions per method.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use quill_api::value::Value;
use quill_rpc_core::interceptor::Decision;
use quill_rpc_core::interceptor::HookContext;
use quill_rpc_core::interceptor::InvocationHook;

use crate::store::ContentStore;

/// Rejects any call whose `username`/`password` pair the store does
/// not recognize. The cancel reason is deliberately uniform so callers
/// cannot probe which half was wrong.
pub struct CredentialGate {
    store: Arc<dyn ContentStore>,
}

impl CredentialGate {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialGate").finish_non_exhaustive()
    }
}

#[async_trait]
impl InvocationHook for CredentialGate {
    async fn evaluate(&self, ctx: &HookContext) -> Decision {
        let username = ctx.named_param("username").and_then(Value::as_str).unwrap_or_default();
        let password = ctx.named_param("password").and_then(Value::as_str).unwrap_or_default();

        match self.store.authenticate(username, password).await {
            Ok(true) => Decision::Proceed,
            Ok(false) => Decision::cancel("invalid login"),
            Err(error) => {
                warn!(method = %ctx.method_name, %error, "credential check failed");
                Decision::cancel("invalid login")
            }
        }
    }
}
