//! Single-assignment deferred results
//!
//! A [`Promise`] starts pending and settles exactly once, to a value or an
//! error. Continuations registered while pending run once, in registration
//! order, on the thread that settles the promise; continuations registered
//! after settlement run immediately on the registering thread. Nothing in
//! the evaluator ever blocks on a promise: waiting is always continuation
//! registration. [`Promise::wait`] exists for hosts that need a concrete
//! result at the edge of the program.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::EvalError;
use crate::value::Value;

/// The result a promise settles to.
pub type Outcome = Result<Value, EvalError>;

type Continuation = Box<dyn FnOnce(Outcome) + Send>;

enum State {
    Pending(Vec<Continuation>),
    Fulfilled(Value),
    Failed(EvalError),
}

impl State {
    fn outcome(&self) -> Option<Outcome> {
        match self {
            State::Pending(_) => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Failed(err) => Some(Err(err.clone())),
        }
    }
}

struct Inner {
    state: Mutex<State>,
    settled: Condvar,
}

/// A deferred value shared between its producer and any number of
/// consumers.
#[derive(Clone)]
pub struct Promise {
    inner: Arc<Inner>,
}

impl Promise {
    /// Create a pending promise.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Pending(Vec::new())),
                settled: Condvar::new(),
            }),
        }
    }

    /// Create a promise that is already settled with `outcome`.
    pub fn settled(outcome: Outcome) -> Self {
        let promise = Self::new();
        promise.fulfil(outcome);
        promise
    }

    /// Create a promise already fulfilled with `value`.
    pub fn fulfilled(value: Value) -> Self {
        Self::settled(Ok(value))
    }

    /// Create a promise already failed with `err`.
    pub fn failed(err: EvalError) -> Self {
        Self::settled(Err(err))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stable identity of the shared state.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Whether both handles share the same state.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Settlement
    // ═══════════════════════════════════════════════════════════════════

    /// Settle the promise.
    ///
    /// Fulfilling with another promise adopts that promise's eventual
    /// outcome instead. Settling an already settled promise is a
    /// programming error; it is logged and ignored.
    pub fn fulfil(&self, outcome: Outcome) {
        if let Ok(Value::Promise(nested)) = &outcome {
            if nested.ptr_eq(self) {
                self.settle(Err(EvalError::Resolution {
                    message: "promise fulfilled with itself".to_string(),
                }));
                return;
            }
            let this = self.clone();
            nested.on_complete(move |outcome| this.fulfil(outcome));
            return;
        }
        self.settle(outcome);
    }

    fn settle(&self, outcome: Outcome) {
        let continuations = {
            let mut state = self.lock();
            if !matches!(*state, State::Pending(_)) {
                tracing::warn!(promise = self.id(), "ignoring second resolution of a promise");
                return;
            }
            let terminal = match &outcome {
                Ok(value) => State::Fulfilled(value.clone()),
                Err(err) => State::Failed(err.clone()),
            };
            let previous = std::mem::replace(&mut *state, terminal);
            self.inner.settled.notify_all();
            match previous {
                State::Pending(continuations) => continuations,
                _ => Vec::new(),
            }
        };

        tracing::trace!(
            promise = self.id(),
            ok = outcome.is_ok(),
            continuations = continuations.len(),
            "promise settled"
        );
        for continuation in continuations {
            continuation(outcome.clone());
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// Whether the promise has not settled yet.
    pub fn is_pending(&self) -> bool {
        matches!(*self.lock(), State::Pending(_))
    }

    /// The outcome, if settled.
    pub fn peek(&self) -> Option<Outcome> {
        self.lock().outcome()
    }

    /// Block the calling thread until the promise settles.
    ///
    /// Intended for hosts forcing a final result. Calling this from a task
    /// that the promise itself depends on deadlocks.
    pub fn wait(&self) -> Outcome {
        let mut state = self.lock();
        loop {
            if let Some(outcome) = state.outcome() {
                return outcome;
            }
            state = self
                .inner
                .settled
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Combinators
    // ═══════════════════════════════════════════════════════════════════

    /// Run `f` with the outcome once settled.
    pub fn on_complete<F>(&self, f: F)
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let ready = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending(continuations) => {
                    continuations.push(Box::new(f));
                    return;
                }
                State::Fulfilled(value) => Ok(value.clone()),
                State::Failed(err) => Err(err.clone()),
            }
        };
        f(ready);
    }

    /// New promise settled with `handler` applied to this promise's outcome.
    ///
    /// The handler sees failures too, which makes it the recovery hook.
    pub fn then<F>(&self, handler: F) -> Promise
    where
        F: FnOnce(Outcome) -> Outcome + Send + 'static,
    {
        let next = Promise::new();
        let target = next.clone();
        self.on_complete(move |outcome| target.fulfil(handler(outcome)));
        next
    }

    /// New promise holding `transform` applied to the fulfilled value.
    ///
    /// A failure skips `transform` and propagates unchanged.
    pub fn map<F>(&self, transform: F) -> Promise
    where
        F: FnOnce(Value) -> Outcome + Send + 'static,
    {
        self.then(move |outcome| outcome.and_then(transform))
    }

    /// Promise of a tuple of all operands once every one has resolved.
    ///
    /// Operands may mix promises and concrete values; positions are kept.
    /// The first failure observed fails the result. Operands that have
    /// already failed are observed in position order.
    pub fn all(operands: Vec<Value>) -> Promise {
        let pending: Vec<(usize, Promise)> = operands
            .iter()
            .enumerate()
            .filter_map(|(index, value)| match value {
                Value::Promise(promise) => Some((index, promise.clone())),
                _ => None,
            })
            .collect();

        if pending.is_empty() {
            return Promise::fulfilled(Value::tuple(operands));
        }

        let result = Promise::new();
        let gather = Arc::new(Mutex::new(Gather {
            remaining: pending.len(),
            values: operands,
            done: false,
        }));

        for (index, promise) in pending {
            let gather = Arc::clone(&gather);
            let result = result.clone();
            promise.on_complete(move |outcome| {
                let finished = {
                    let mut gather = gather.lock().unwrap_or_else(PoisonError::into_inner);
                    gather.record(index, outcome)
                };
                if let Some(outcome) = finished {
                    result.fulfil(outcome);
                }
            });
        }
        result
    }
}

struct Gather {
    values: Vec<Value>,
    remaining: usize,
    done: bool,
}

impl Gather {
    /// Store one operand's outcome; returns the combined outcome when the
    /// gather completes.
    fn record(&mut self, index: usize, outcome: Outcome) -> Option<Outcome> {
        if self.done {
            return None;
        }
        match outcome {
            Ok(value) => {
                self.values[index] = value;
                self.remaining -= 1;
                if self.remaining > 0 {
                    return None;
                }
                self.done = true;
                Some(Ok(Value::tuple(std::mem::take(&mut self.values))))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl Default for Promise {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peek() {
            None => write!(f, "<promise pending>"),
            Some(Ok(value)) => write!(f, "<promise {:?}>", value),
            Some(Err(err)) => write!(f, "<promise failed: {}>", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_settles_once() {
        let promise = Promise::new();
        assert!(promise.is_pending());
        promise.fulfil(Ok(Value::Integer(1)));
        promise.fulfil(Ok(Value::Integer(2)));
        assert_eq!(promise.peek().unwrap().unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_continuations_run_in_registration_order() {
        let promise = Promise::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let log = Arc::clone(&log);
            promise.on_complete(move |_| log.lock().unwrap().push(i));
        }
        assert!(log.lock().unwrap().is_empty());
        promise.fulfil(Ok(Value::Unit));
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_continuation_after_settlement_runs_immediately() {
        let promise = Promise::fulfilled(Value::Integer(3));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        promise.on_complete(move |outcome| {
            assert_eq!(outcome.unwrap(), Value::Integer(3));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_nested_promise_is_flattened() {
        let inner = Promise::new();
        let outer = Promise::new();
        outer.fulfil(Ok(Value::Promise(inner.clone())));
        assert!(outer.is_pending());
        inner.fulfil(Ok(Value::Integer(9)));
        assert_eq!(outer.peek().unwrap().unwrap(), Value::Integer(9));
    }

    #[test]
    fn test_self_fulfilment_fails() {
        let promise = Promise::new();
        promise.fulfil(Ok(Value::Promise(promise.clone())));
        assert!(matches!(promise.peek(), Some(Err(EvalError::Resolution { .. }))));
    }

    #[test]
    fn test_map_skips_on_failure() {
        let source = Promise::failed(EvalError::DivisionByZero);
        let mapped = source.map(|_| panic!("transform must not run"));
        assert!(matches!(mapped.peek(), Some(Err(EvalError::DivisionByZero))));
    }

    #[test]
    fn test_then_can_recover() {
        let source = Promise::failed(EvalError::DivisionByZero);
        let recovered = source.then(|outcome| match outcome {
            Ok(v) => Ok(v),
            Err(_) => Ok(Value::Integer(0)),
        });
        assert_eq!(recovered.peek().unwrap().unwrap(), Value::Integer(0));
    }

    #[test]
    fn test_all_keeps_positions() {
        let a = Promise::new();
        let b = Promise::new();
        let all = Promise::all(vec![
            Value::Promise(a.clone()),
            Value::Integer(2),
            Value::Promise(b.clone()),
        ]);
        b.fulfil(Ok(Value::Integer(3)));
        assert!(all.is_pending());
        a.fulfil(Ok(Value::Integer(1)));
        assert_eq!(
            all.peek().unwrap().unwrap(),
            Value::tuple(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
        );
    }

    #[test]
    fn test_all_without_promises_is_settled() {
        let all = Promise::all(vec![Value::Integer(1)]);
        assert_eq!(
            all.peek().unwrap().unwrap(),
            Value::tuple(vec![Value::Integer(1)])
        );
    }

    #[test]
    fn test_all_first_failure_wins() {
        let a = Promise::new();
        let b = Promise::new();
        let all = Promise::all(vec![Value::Promise(a.clone()), Value::Promise(b.clone())]);
        b.fulfil(Err(EvalError::DivisionByZero));
        a.fulfil(Err(EvalError::Interrupted));
        assert!(matches!(all.peek(), Some(Err(EvalError::DivisionByZero))));
    }

    #[test]
    fn test_all_settled_failures_in_position_order() {
        let all = Promise::all(vec![
            Value::Promise(Promise::failed(EvalError::Interrupted)),
            Value::Promise(Promise::failed(EvalError::DivisionByZero)),
        ]);
        assert!(matches!(all.peek(), Some(Err(EvalError::Interrupted))));
    }

    #[test]
    fn test_wait_across_threads() {
        let promise = Promise::new();
        let producer = promise.clone();
        let handle = std::thread::spawn(move || producer.fulfil(Ok(Value::Integer(5))));
        assert_eq!(promise.wait().unwrap(), Value::Integer(5));
        handle.join().unwrap();
    }
}
