use thiserror::Error;

/// Failure reported by a [`crate::engine::TransactionEngine`] implementation.
///
/// The engine is an opaque collaborator; all it owes the orchestration layer
/// is a human-readable message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Everything that can go wrong between a submit action and a rendered
/// outcome. All variants are caught at the invoker boundary and turned into
/// the single user-visible error string; none terminate the session.
#[derive(Debug, Clone, Error)]
pub enum PlaygroundError {
    /// The engine failed to load. Fatal for the session until a fresh
    /// initialization succeeds; blocks all submissions.
    #[error("engine failed to initialize: {0}")]
    EngineInitFailure(String),

    /// A submission was attempted before the runtime reached Ready. The
    /// submission is rejected, never queued.
    #[error("engine not ready; initialization has not completed")]
    EngineNotReady,

    /// A numeric field reached normalization without being a valid u64
    /// decimal string. Per-keystroke sanitization makes this unreachable for
    /// UI-driven input; seeing it means a value bypassed the sanitizer
    /// (e.g. supplied on the command line) or overflowed 64 bits.
    #[error("invalid numeric input for {field}: {value:?}")]
    InvalidNumericInput { field: String, value: String },

    /// The engine rejected the request (bad script, bad account state, ...).
    /// Always recoverable: edit the inputs and resubmit.
    #[error("execution failed: {0}")]
    EngineExecutionFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_displays_its_message_verbatim() {
        let err = EngineError::new("bad script");
        assert_eq!(err.to_string(), "bad script");
    }

    #[test]
    fn not_ready_message_names_the_condition() {
        assert!(PlaygroundError::EngineNotReady
            .to_string()
            .contains("not ready"));
    }

    #[test]
    fn numeric_error_names_the_field_and_value() {
        let err = PlaygroundError::InvalidNumericInput {
            field: "note input 3".into(),
            value: "12a3".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("note input 3"));
        assert!(msg.contains("12a3"));
    }

    #[test]
    fn wrapped_messages_survive_formatting() {
        let init = PlaygroundError::EngineInitFailure("bundle missing".into());
        assert!(init.to_string().contains("bundle missing"));
        let exec = PlaygroundError::EngineExecutionFailure("bad script".into());
        assert!(exec.to_string().contains("bad script"));
    }
}
