//! Before/after hooks around an invocation.
//!
//! Hooks run in registration order and see the invocation context (method
//! name, positional and named parameters, and in the after phase the
//! result). A before hook can veto the call; after hooks only observe.
//! Every hook shape evaluates through the same contract, so the chain
//! never cares which kind it is running.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use tracing::trace;

use quill_api::Value;

/// Outcome of evaluating a before hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the invocation continue.
    Proceed,
    /// Stop the invocation.
    ///
    /// With a reason, the caller sees a dispatch error carrying it. With
    /// no reason, the call is dropped silently and the caller gets an
    /// empty success. The two outcomes must stay distinct.
    Cancel { reason: Option<String> },
}

impl Decision {
    /// Cancel and report the reason to the caller.
    pub fn cancel(reason: impl Into<String>) -> Self {
        Decision::Cancel {
            reason: Some(reason.into()),
        }
    }

    /// Cancel without telling the caller why.
    pub fn cancel_silently() -> Self {
        Decision::Cancel { reason: None }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, Decision::Proceed)
    }
}

/// Everything a hook can see about the invocation.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Resolved service name.
    pub service_name: String,
    /// Public method name the caller used.
    pub method_name: String,
    /// Positional parameters, casted where a signature was declared.
    pub params: Vec<Value>,
    /// Declared parameter names zipped with the positional values.
    pub named_params: std::collections::HashMap<String, Value>,
    /// The casted return value. Only set for the after phase.
    pub result: Option<Value>,
}

impl HookContext {
    pub fn new(
        service_name: impl Into<String>,
        method_name: impl Into<String>,
        params: Vec<Value>,
        named_params: std::collections::HashMap<String, Value>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            method_name: method_name.into(),
            params,
            named_params,
            result: None,
        }
    }

    /// Attach the invocation result for the after phase.
    pub fn with_result(mut self, result: Option<Value>) -> Self {
        self.result = result;
        self
    }

    /// Look up a parameter by its declared name.
    pub fn named_param(&self, name: &str) -> Option<&Value> {
        self.named_params.get(name)
    }
}

/// Trait for hook objects.
///
/// Implementations must be thread-safe; the same hook instance may guard
/// many concurrent invocations.
#[async_trait]
pub trait InvocationHook: Send + Sync {
    /// Evaluate the hook against one invocation.
    async fn evaluate(&self, ctx: &HookContext) -> Decision;
}

/// Type alias for async hook functions.
pub type HookFn =
    Arc<dyn Fn(&HookContext) -> Pin<Box<dyn Future<Output = Decision> + Send + '_>> + Send + Sync>;

/// The three hook shapes a service can register.
///
/// All three evaluate through the same contract; the variants only differ
/// in how the hook is expressed and how it shows up in logs.
#[derive(Clone)]
pub enum HookKind {
    /// A hook object with a label for diagnostics.
    Named {
        label: String,
        hook: Arc<dyn InvocationHook>,
    },
    /// A bare async function.
    Function(HookFn),
    /// An anonymous hook object.
    Object(Arc<dyn InvocationHook>),
}

impl HookKind {
    /// Wrap an async closure as a hook.
    pub fn function<F, Fut>(hook: F) -> Self
    where
        F: Fn(&HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Decision> + Send + 'static,
    {
        HookKind::Function(Arc::new(move |ctx| Box::pin(hook(ctx))))
    }

    /// Wrap a hook object under a label.
    pub fn named(label: impl Into<String>, hook: Arc<dyn InvocationHook>) -> Self {
        HookKind::Named {
            label: label.into(),
            hook,
        }
    }

    /// Wrap an anonymous hook object.
    pub fn object(hook: Arc<dyn InvocationHook>) -> Self {
        HookKind::Object(hook)
    }

    /// Evaluate whichever shape this is.
    pub async fn evaluate(&self, ctx: &HookContext) -> Decision {
        match self {
            HookKind::Named { hook, .. } => hook.evaluate(ctx).await,
            HookKind::Function(hook) => hook(ctx).await,
            HookKind::Object(hook) => hook.evaluate(ctx).await,
        }
    }

    /// Short description for logging.
    pub fn describe(&self) -> &str {
        match self {
            HookKind::Named { label, .. } => label,
            HookKind::Function(_) => "function",
            HookKind::Object(_) => "object",
        }
    }
}

impl std::fmt::Debug for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookKind").field("kind", &self.describe()).finish()
    }
}

/// Method-name scope for one hook registration.
///
/// An inclusion set is authoritative: when present, only listed names
/// trigger the hook and any exclusion set is ignored. Otherwise an
/// exclusion set suppresses listed names. No filter means the hook always
/// applies.
#[derive(Debug, Clone, Default)]
pub struct HookFilter {
    only: Option<HashSet<String>>,
    except: Option<HashSet<String>>,
}

impl HookFilter {
    /// Filter that admits every method.
    pub fn any() -> Self {
        Self::default()
    }

    /// Trigger only for the listed public method names.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: Some(names.into_iter().map(Into::into).collect()),
            except: None,
        }
    }

    /// Trigger for everything except the listed public method names.
    pub fn except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: None,
            except: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Whether the hook should run for this method name.
    pub fn applies_to(&self, method_name: &str) -> bool {
        if let Some(only) = &self.only {
            return only.contains(method_name);
        }
        if let Some(except) = &self.except {
            return !except.contains(method_name);
        }
        true
    }
}

/// Ordered before/after hook lists for one service.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    before: Vec<(HookKind, HookFilter)>,
    after: Vec<(HookKind, HookFilter)>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a before hook at the tail of the chain.
    pub fn append_before(&mut self, hook: HookKind, filter: HookFilter) {
        self.before.push((hook, filter));
    }

    /// Add a before hook at the head of the chain.
    pub fn prepend_before(&mut self, hook: HookKind, filter: HookFilter) {
        self.before.insert(0, (hook, filter));
    }

    /// Add an after hook at the tail of the chain.
    pub fn append_after(&mut self, hook: HookKind, filter: HookFilter) {
        self.after.push((hook, filter));
    }

    /// Add an after hook at the head of the chain.
    pub fn prepend_after(&mut self, hook: HookKind, filter: HookFilter) {
        self.after.insert(0, (hook, filter));
    }

    /// Builder-style [`append_before`](Self::append_before).
    pub fn with_before(mut self, hook: HookKind, filter: HookFilter) -> Self {
        self.append_before(hook, filter);
        self
    }

    /// Builder-style [`append_after`](Self::append_after).
    pub fn with_after(mut self, hook: HookKind, filter: HookFilter) -> Self {
        self.append_after(hook, filter);
        self
    }

    pub fn before_len(&self) -> usize {
        self.before.len()
    }

    pub fn after_len(&self) -> usize {
        self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    /// Run before hooks in order. The first cancellation wins: remaining
    /// hooks are skipped and the decision is returned as-is.
    pub async fn run_before(&self, ctx: &HookContext) -> Decision {
        for (hook, filter) in &self.before {
            if !filter.applies_to(&ctx.method_name) {
                trace!(hook = hook.describe(), method = %ctx.method_name, "before hook skipped by filter");
                continue;
            }
            match hook.evaluate(ctx).await {
                Decision::Proceed => {
                    trace!(hook = hook.describe(), method = %ctx.method_name, "before hook passed");
                }
                cancel @ Decision::Cancel { .. } => {
                    debug!(hook = hook.describe(), method = %ctx.method_name, "before hook canceled invocation");
                    return cancel;
                }
            }
        }
        Decision::Proceed
    }

    /// Run after hooks in order. After hooks observe only; their
    /// decisions are ignored.
    pub async fn run_after(&self, ctx: &HookContext) {
        for (hook, filter) in &self.after {
            if !filter.applies_to(&ctx.method_name) {
                continue;
            }
            let _ = hook.evaluate(ctx).await;
        }
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("before_count", &self.before.len())
            .field("after_count", &self.after.len())
            .finish()
    }
}
