//! Engine boundary and runtime lifecycle.
//!
//! The execution engine is an opaque collaborator reached through a single
//! trait. [`RuntimeHandle`] owns its lifecycle: it guarantees no execution
//! call is attempted while the runtime is not ready, under either
//! initialization policy.

mod local;

pub use local::LocalEngine;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{EngineError, PlaygroundError};
use crate::model::{ExecutionArgs, ExecutionOutputs, InitPolicy};

/// The external transaction-execution engine.
///
/// Both operations may block (compilation, trace generation); callers run
/// them on the blocking pool. `initialize` must complete successfully before
/// any `execute` call is issued.
pub trait TransactionEngine: Send + Sync {
    fn initialize(&self) -> Result<(), EngineError>;
    fn execute(&self, args: &ExecutionArgs) -> Result<ExecutionOutputs, EngineError>;
}

/// Shared handle over the engine plus its readiness state.
///
/// Cheap to clone; clones observe the same readiness flag, so a controller
/// task and a spawned submission task agree on whether the runtime is up.
#[derive(Clone)]
pub struct RuntimeHandle {
    engine: Arc<dyn TransactionEngine>,
    policy: InitPolicy,
    ready: Arc<AtomicBool>,
}

impl RuntimeHandle {
    pub fn new(engine: Arc<dyn TransactionEngine>, policy: InitPolicy) -> Self {
        Self {
            engine,
            policy,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn policy(&self) -> InitPolicy {
        self.policy
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Load the engine. On success the handle transitions to Ready; on
    /// failure it stays NotReady and every submission is blocked until a
    /// retry succeeds.
    pub async fn initialize(&self) -> Result<(), PlaygroundError> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.initialize())
            .await
            .map_err(|e| PlaygroundError::EngineInitFailure(format!("initialization task failed: {e}")))?
            .map_err(|e| PlaygroundError::EngineInitFailure(e.to_string()))?;
        self.ready.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Fail fast if the runtime is not ready; submissions are rejected, never
    /// queued.
    pub fn ensure_ready(&self) -> Result<(), PlaygroundError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(PlaygroundError::EngineNotReady)
        }
    }

    /// Issue the single engine execution call. The sole suspension point of
    /// the submission pipeline; there is no cancellation once issued.
    pub async fn execute(&self, args: ExecutionArgs) -> Result<ExecutionOutputs, PlaygroundError> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.execute(&args))
            .await
            .map_err(|e| PlaygroundError::EngineExecutionFailure(format!("execution task failed: {e}")))?
            .map_err(|e| PlaygroundError::EngineExecutionFailure(e.to_string()))
    }

    /// Drop readiness, forcing a fresh `initialize` before the next call.
    /// Used by the session reset action.
    pub fn invalidate(&self) {
        self.ready.store(false, Ordering::Relaxed);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::StubEngine;
    use super::*;

    #[tokio::test]
    async fn handle_starts_not_ready_and_initializes_once() {
        let handle = RuntimeHandle::new(Arc::new(StubEngine::ok()), InitPolicy::Startup);
        assert!(!handle.is_ready());
        assert!(matches!(
            handle.ensure_ready(),
            Err(PlaygroundError::EngineNotReady)
        ));

        handle.initialize().await.unwrap();
        assert!(handle.is_ready());
        handle.ensure_ready().unwrap();
    }

    #[tokio::test]
    async fn failed_init_leaves_handle_not_ready() {
        let handle = RuntimeHandle::new(
            Arc::new(StubEngine::failing_init("no runtime bundle")),
            InitPolicy::Startup,
        );
        let err = handle.initialize().await.unwrap_err();
        assert!(err.to_string().contains("no runtime bundle"));
        assert!(!handle.is_ready());
    }

    #[tokio::test]
    async fn clones_share_readiness() {
        let handle = RuntimeHandle::new(Arc::new(StubEngine::ok()), InitPolicy::Startup);
        let clone = handle.clone();
        handle.initialize().await.unwrap();
        assert!(clone.is_ready());

        clone.invalidate();
        assert!(!handle.is_ready());
    }
}
