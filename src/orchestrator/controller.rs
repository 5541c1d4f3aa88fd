//! Session lifecycle controller.
//!
//! Owns the runtime handle and the in-flight submission, and emits events
//! for presentation layers. Submissions are strictly serialized: a submit
//! observed while one is running is ignored with an informational event and
//! never touches the outcome.

use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::invoker;
use crate::engine::RuntimeHandle;
use crate::error::PlaygroundError;
use crate::model::{ExecutionOutputs, FormState, InitPolicy};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    /// Submit the given form snapshot for execution.
    Submit(FormState),
    /// Reset the session: runtime back to NotReady and re-initialized.
    Reset,
    Quit,
}

/// Events consumed by UI layers and applied to their session state.
#[derive(Debug, Clone)]
pub(crate) enum SessionEvent {
    RuntimeReady,
    /// Per-call policy: the runtime is not loaded yet, but submissions are
    /// accepted because each one initializes the engine itself.
    AcceptingSubmissions,
    RuntimeInitFailed { message: String },
    /// A submission was accepted; prior outcome must be cleared now.
    SubmissionStarted,
    ExecutionCompleted { outputs: Box<ExecutionOutputs> },
    ExecutionFailed { message: String },
    SessionReset,
    Info(String),
}

/// Kick off runtime initialization according to policy. Per-call policy has
/// nothing to do at startup: each submission initializes itself, so the
/// session accepts submissions immediately.
fn start_init(
    runtime: &RuntimeHandle,
    event_tx: &UnboundedSender<SessionEvent>,
) -> Option<JoinHandle<Result<(), PlaygroundError>>> {
    match runtime.policy() {
        InitPolicy::Startup => {
            let rt = runtime.clone();
            Some(tokio::spawn(async move { rt.initialize().await }))
        }
        InitPolicy::PerCall => {
            let _ = event_tx.send(SessionEvent::AcceptingSubmissions);
            None
        }
    }
}

/// Drive the session based on UI commands and emit events back.
pub(crate) async fn run_controller(
    runtime: RuntimeHandle,
    event_tx: UnboundedSender<SessionEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut init_handle = start_init(&runtime, &event_tx);
    let mut inflight: Option<JoinHandle<Result<ExecutionOutputs, PlaygroundError>>> = None;
    let mut quit_pending = false;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(form)) => {
                        if inflight.is_some() {
                            let _ = event_tx.send(SessionEvent::Info(
                                "Execution already running".into(),
                            ));
                        } else {
                            let _ = event_tx.send(SessionEvent::SubmissionStarted);
                            let rt = runtime.clone();
                            inflight = Some(tokio::spawn(async move {
                                invoker::execute_once(&rt, &form).await
                            }));
                        }
                    }
                    Some(UiCommand::Reset) => {
                        if inflight.is_some() {
                            let _ = event_tx.send(SessionEvent::Info(
                                "Cannot reset while an execution is running".into(),
                            ));
                        } else {
                            runtime.invalidate();
                            let _ = event_tx.send(SessionEvent::SessionReset);
                            init_handle = start_init(&runtime, &event_tx);
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // There is no cancellation: an issued engine call runs
                        // to completion, so quitting waits for it.
                        if inflight.is_some() {
                            quit_pending = true;
                            let _ = event_tx.send(SessionEvent::Info(
                                "Waiting for execution to finish".into(),
                            ));
                        } else {
                            break Ok(());
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it
            // can be dropped when another branch is chosen and completion is
            // never observed.
            maybe_init = async {
                match init_handle.as_mut() {
                    Some(h) => Some(h.await),
                    None => futures::future::pending().await,
                }
            } => {
                if let Some(join_res) = maybe_init {
                    init_handle = None;
                    match join_res {
                        Ok(Ok(())) => {
                            let _ = event_tx.send(SessionEvent::RuntimeReady);
                        }
                        Ok(Err(e)) => {
                            let _ = event_tx.send(SessionEvent::RuntimeInitFailed {
                                message: e.to_string(),
                            });
                        }
                        Err(e) => {
                            let _ = event_tx.send(SessionEvent::RuntimeInitFailed {
                                message: format!("initialization task failed: {e}"),
                            });
                        }
                    }
                }
            }
            maybe_done = async {
                match inflight.as_mut() {
                    Some(h) => Some(h.await),
                    None => futures::future::pending().await,
                }
            } => {
                if let Some(join_res) = maybe_done {
                    inflight = None;
                    match join_res {
                        Ok(Ok(outputs)) => {
                            let _ = event_tx.send(SessionEvent::ExecutionCompleted {
                                outputs: Box::new(outputs),
                            });
                        }
                        Ok(Err(e)) => {
                            let _ = event_tx.send(SessionEvent::ExecutionFailed {
                                message: e.to_string(),
                            });
                        }
                        Err(e) => {
                            let _ = event_tx.send(SessionEvent::ExecutionFailed {
                                message: format!("execution task failed: {e}"),
                            });
                        }
                    }
                    if quit_pending {
                        break Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::StubEngine;
    use crate::engine::TransactionEngine;
    use crate::error::EngineError;
    use crate::model::ExecutionArgs;
    use std::sync::mpsc as std_mpsc;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    /// Engine whose execute blocks until the test releases it.
    struct GatedEngine {
        gate: Mutex<std_mpsc::Receiver<()>>,
    }

    impl GatedEngine {
        fn new() -> (Self, std_mpsc::Sender<()>) {
            let (tx, rx) = std_mpsc::channel();
            (
                Self {
                    gate: Mutex::new(rx),
                },
                tx,
            )
        }
    }

    impl TransactionEngine for GatedEngine {
        fn initialize(&self) -> Result<(), EngineError> {
            Ok(())
        }

        fn execute(&self, args: &ExecutionArgs) -> Result<ExecutionOutputs, EngineError> {
            self.gate
                .lock()
                .unwrap()
                .recv()
                .map_err(|_| EngineError::new("gate closed"))?;
            StubEngine::ok().execute(args)
        }
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn submit_while_running_is_ignored() {
        let (engine, release) = GatedEngine::new();
        let runtime = RuntimeHandle::new(Arc::new(engine), InitPolicy::Startup);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let controller = tokio::spawn(run_controller(runtime, event_tx, cmd_rx));

        assert!(matches!(recv(&mut event_rx).await, SessionEvent::RuntimeReady));

        cmd_tx.send(UiCommand::Submit(FormState::default())).unwrap();
        assert!(matches!(
            recv(&mut event_rx).await,
            SessionEvent::SubmissionStarted
        ));

        // Second submit while the first is parked inside the engine.
        cmd_tx.send(UiCommand::Submit(FormState::default())).unwrap();
        match recv(&mut event_rx).await {
            SessionEvent::Info(msg) => assert!(msg.contains("already running")),
            other => panic!("expected busy info, got {other:?}"),
        }

        release.send(()).unwrap();
        assert!(matches!(
            recv(&mut event_rx).await,
            SessionEvent::ExecutionCompleted { .. }
        ));

        // Exactly one completion: the second submit never started.
        cmd_tx.send(UiCommand::Quit).unwrap();
        controller.await.unwrap().unwrap();
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn per_call_policy_accepts_submissions_without_claiming_readiness() {
        let runtime = RuntimeHandle::new(Arc::new(StubEngine::ok()), InitPolicy::PerCall);
        let probe = runtime.clone();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let controller = tokio::spawn(run_controller(runtime, event_tx, cmd_rx));

        // The handle has not initialized anything yet, so the session must
        // not be told the runtime is ready, only that submits are accepted.
        assert!(matches!(
            recv(&mut event_rx).await,
            SessionEvent::AcceptingSubmissions
        ));
        assert!(!probe.is_ready());

        cmd_tx.send(UiCommand::Submit(FormState::default())).unwrap();
        assert!(matches!(
            recv(&mut event_rx).await,
            SessionEvent::SubmissionStarted
        ));
        assert!(matches!(
            recv(&mut event_rx).await,
            SessionEvent::ExecutionCompleted { .. }
        ));

        cmd_tx.send(UiCommand::Quit).unwrap();
        controller.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn failed_execution_reports_the_engine_message() {
        let runtime = RuntimeHandle::new(
            Arc::new(StubEngine::failing_exec("bad script")),
            InitPolicy::Startup,
        );
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let controller = tokio::spawn(run_controller(runtime, event_tx, cmd_rx));

        assert!(matches!(recv(&mut event_rx).await, SessionEvent::RuntimeReady));
        cmd_tx.send(UiCommand::Submit(FormState::default())).unwrap();
        assert!(matches!(
            recv(&mut event_rx).await,
            SessionEvent::SubmissionStarted
        ));
        match recv(&mut event_rx).await {
            SessionEvent::ExecutionFailed { message } => {
                assert!(message.contains("bad script"));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        cmd_tx.send(UiCommand::Quit).unwrap();
        controller.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn init_failure_blocks_until_reset_retries() {
        let runtime = RuntimeHandle::new(
            Arc::new(StubEngine::failing_init("bundle missing")),
            InitPolicy::Startup,
        );
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let controller = tokio::spawn(run_controller(runtime, event_tx, cmd_rx));

        match recv(&mut event_rx).await {
            SessionEvent::RuntimeInitFailed { message } => {
                assert!(message.contains("bundle missing"));
            }
            other => panic!("expected init failure, got {other:?}"),
        }

        // Submissions against the dead runtime are rejected, not queued.
        cmd_tx.send(UiCommand::Submit(FormState::default())).unwrap();
        assert!(matches!(
            recv(&mut event_rx).await,
            SessionEvent::SubmissionStarted
        ));
        match recv(&mut event_rx).await {
            SessionEvent::ExecutionFailed { message } => {
                assert!(message.contains("not ready"));
            }
            other => panic!("expected not-ready failure, got {other:?}"),
        }

        // Reset retries initialization (still failing here, but retried).
        cmd_tx.send(UiCommand::Reset).unwrap();
        assert!(matches!(recv(&mut event_rx).await, SessionEvent::SessionReset));
        assert!(matches!(
            recv(&mut event_rx).await,
            SessionEvent::RuntimeInitFailed { .. }
        ));

        cmd_tx.send(UiCommand::Quit).unwrap();
        controller.await.unwrap().unwrap();
    }
}
