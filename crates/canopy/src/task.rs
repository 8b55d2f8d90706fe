//! Task submission for `async` blocks
//!
//! The evaluator only needs one capability from the outside world: hand a
//! closure to something that will run it to completion eventually, without
//! blocking the submitter. [`TaskExecutor`] is that seam. [`WorkerPool`]
//! implements it on a `tokio` runtime's blocking pool, [`SharedPool`] lazily
//! starts one process-wide pool, and [`InlineExecutor`] runs tasks on the
//! submitting thread for deterministic tests.

use std::fmt;
use std::sync::OnceLock;

use crate::error::EvalError;

/// A unit of work submitted to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs submitted tasks to completion.
pub trait TaskExecutor: Send + Sync + fmt::Debug {
    /// Queue `task` without waiting for it to run.
    fn submit(&self, task: Task) -> Result<(), EvalError>;
}

// ═══════════════════════════════════════════════════════════════════════
// Worker Pool
// ═══════════════════════════════════════════════════════════════════════

/// Worker pool settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Upper bound on threads running tasks concurrently
    pub max_workers: usize,

    /// Name given to worker threads
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            thread_name: "canopy-worker".to_string(),
        }
    }
}

impl PoolConfig {
    /// Config with a specific worker limit.
    pub fn with_max_workers(max_workers: usize) -> Self {
        Self {
            max_workers,
            ..Default::default()
        }
    }
}

/// A pool of worker threads backed by a `tokio` multi-thread runtime.
///
/// Tasks are plain blocking closures, so they go to the runtime's blocking
/// pool. Dropping the pool shuts the runtime down in the background: running
/// tasks finish, queued ones are discarded.
pub struct WorkerPool {
    runtime: Option<tokio::runtime::Runtime>,
    config: PoolConfig,
}

impl WorkerPool {
    /// Start a pool.
    pub fn new(config: PoolConfig) -> Result<Self, EvalError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.max_workers.max(1))
            .thread_name(config.thread_name.clone())
            .build()
            .map_err(|e| EvalError::TaskFailed {
                message: format!("failed to start worker pool: {}", e),
            })?;
        tracing::debug!(
            max_workers = config.max_workers,
            thread_name = %config.thread_name,
            "worker pool started"
        );
        Ok(Self {
            runtime: Some(runtime),
            config,
        })
    }

    /// The settings the pool was started with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

impl TaskExecutor for WorkerPool {
    fn submit(&self, task: Task) -> Result<(), EvalError> {
        match &self.runtime {
            Some(runtime) => {
                // Detached: the task reports through its promise
                drop(runtime.spawn_blocking(task));
                Ok(())
            }
            None => Err(EvalError::TaskFailed {
                message: "worker pool is shut down".to_string(),
            }),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            tracing::debug!(thread_name = %self.config.thread_name, "worker pool stopped");
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("running", &self.runtime.is_some())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Shared Pool
// ═══════════════════════════════════════════════════════════════════════

static SHARED_POOL: OnceLock<Result<WorkerPool, String>> = OnceLock::new();

/// The process-wide pool, started with [`PoolConfig::default`] on first use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedPool;

impl SharedPool {
    /// Get the shared pool, starting it if needed.
    pub fn pool() -> Result<&'static WorkerPool, EvalError> {
        SHARED_POOL
            .get_or_init(|| WorkerPool::new(PoolConfig::default()).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|message| EvalError::TaskFailed {
                message: message.clone(),
            })
    }
}

impl TaskExecutor for SharedPool {
    fn submit(&self, task: Task) -> Result<(), EvalError> {
        Self::pool()?.submit(task)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Inline Executor
// ═══════════════════════════════════════════════════════════════════════

/// Runs each task immediately on the submitting thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn submit(&self, task: Task) -> Result<(), EvalError> {
        task();
        Ok(())
    }
}
