//! The per-submission pipeline.

use crate::engine::RuntimeHandle;
use crate::error::PlaygroundError;
use crate::model::{ExecutionOutputs, FormState, InitPolicy};
use crate::normalize;

/// Run one submission end to end: readiness, normalization, the single
/// engine call.
///
/// Under the per-call policy the full initialization happens here, inside
/// the submission, before the engine call; under the startup policy the
/// caller must have initialized the runtime already or the submission fails
/// with `EngineNotReady`. Either way no execution call is attempted while
/// the runtime is not ready.
pub(crate) async fn execute_once(
    runtime: &RuntimeHandle,
    form: &FormState,
) -> Result<ExecutionOutputs, PlaygroundError> {
    if runtime.policy() == InitPolicy::PerCall {
        runtime.initialize().await?;
    }
    runtime.ensure_ready()?;
    let args = normalize::build_args(form)?;
    runtime.execute(args).await
}
