//! Settings and shared state threaded through evaluation

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::task::{SharedPool, TaskExecutor};
use crate::value::{Fqn, ModuleValue};

/// Modules known to the evaluator, keyed by fully-qualified name.
///
/// Shared between every clone of a context, including the ones that
/// continuations carry to worker threads.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Arc<DashMap<Fqn, Arc<ModuleValue>>>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing any module with the same name.
    pub fn register(&self, module: Arc<ModuleValue>) {
        tracing::debug!(module = %module.fqn(), "module registered");
        self.modules.insert(module.fqn().clone(), module);
    }

    /// Look up a module.
    pub fn get(&self, fqn: &Fqn) -> Option<Arc<ModuleValue>> {
        self.modules.get(fqn).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module is registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Everything evaluation needs besides the environment.
///
/// Continuations and async tasks each carry a clone. Clones share the
/// interrupt flag, the executor and the module registry, so interrupting
/// one stops work scheduled from any of them.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Calls deeper than this fail with `StackOverflow`
    pub max_call_depth: usize,

    /// Checked before every expression
    pub interrupt: Arc<AtomicBool>,

    /// Emit a `trace` event per expression and call
    pub trace: bool,

    /// Where `async` tasks are submitted
    pub executor: Arc<dyn TaskExecutor>,

    /// Modules visible to `ModuleRef` expressions
    pub modules: ModuleRegistry,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_call_depth: 1000,
            interrupt: Arc::new(AtomicBool::new(false)),
            trace: false,
            executor: Arc::new(SharedPool),
            modules: ModuleRegistry::new(),
        }
    }
}

impl EvalContext {
    /// Default settings on the shared worker pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings with a different call depth limit.
    pub fn with_max_call_depth(limit: usize) -> Self {
        Self {
            max_call_depth: limit,
            ..Self::default()
        }
    }

    /// Use `executor` for `async` tasks.
    pub fn with_executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Turn expression tracing on or off.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Whether [`EvalContext::interrupt`] has been called since the last reset.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Acquire)
    }

    /// Make every evaluation sharing this flag fail with `Interrupted`.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Release);
    }

    /// Allow evaluation again.
    pub fn reset_interrupt(&self) {
        self.interrupt.store(false, Ordering::Release);
    }
}
