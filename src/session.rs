//! Per-session mutable state: the single source of truth the presentation
//! layer renders from.
//!
//! Field ownership is strict: the presentation layer writes `FormState`
//! through the setters here, the invoker writes `OutcomeState`, the runtime
//! lifecycle writes `RuntimeState`. Nothing else mutates anything.

use crate::model::{ExecutionOutputs, FormState, NOTE_INPUT_SLOTS};
use crate::normalize::sanitize_digit_field;

/// Readiness of the external engine runtime. `NotReady → Ready` happens at
/// most once per load cycle; only a full session reset goes back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeState {
    pub ready: bool,
}

/// Mutually exclusive result-or-error of the last completed submission.
/// Both sides are cleared when a new submission starts so stale output is
/// never shown next to a fresh outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeState {
    result: Option<ExecutionOutputs>,
    error: Option<String>,
    completed_at: Option<String>,
}

impl OutcomeState {
    pub fn result(&self) -> Option<&ExecutionOutputs> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// RFC 3339 timestamp of the last successful execution.
    pub fn completed_at(&self) -> Option<&str> {
        self.completed_at.as_deref()
    }

    fn clear(&mut self) {
        self.result = None;
        self.error = None;
        self.completed_at = None;
    }
}

/// The session aggregate: form, runtime readiness, and last outcome.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    form: FormState,
    runtime: RuntimeState,
    outcome: OutcomeState,
}

impl SessionState {
    pub fn new(form: FormState) -> Self {
        Self {
            form,
            runtime: RuntimeState::default(),
            outcome: OutcomeState::default(),
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn runtime(&self) -> RuntimeState {
        self.runtime
    }

    pub fn outcome(&self) -> &OutcomeState {
        &self.outcome
    }

    // Form setters, one per field. Numeric fields sanitize the whole new
    // value on every edit, so an invalid keystroke lands as "0" rather than
    // being rejected.

    pub fn set_note_script(&mut self, text: String) {
        self.form.note_script = text;
    }

    pub fn set_account_code(&mut self, text: String) {
        self.form.account_code = text;
    }

    pub fn set_transaction_script(&mut self, text: String) {
        self.form.transaction_script = text;
    }

    /// Replace note-input slot `index` with the sanitized `raw` value.
    /// Out-of-range indexes are ignored; the form has exactly
    /// [`NOTE_INPUT_SLOTS`] slots.
    pub fn set_note_input(&mut self, index: usize, raw: &str) {
        if index < NOTE_INPUT_SLOTS {
            self.form.note_inputs[index] = sanitize_digit_field(raw);
        }
    }

    pub fn set_asset_amount(&mut self, raw: &str) {
        self.form.asset_amount = sanitize_digit_field(raw);
    }

    pub fn set_wallet_enabled(&mut self, enabled: bool) {
        self.form.wallet_enabled = enabled;
    }

    pub fn set_auth_enabled(&mut self, enabled: bool) {
        self.form.auth_enabled = enabled;
    }

    pub fn set_runtime_ready(&mut self, ready: bool) {
        self.runtime.ready = ready;
    }

    /// Start of a new submission: drop the previous outcome entirely.
    pub fn begin_submission(&mut self) {
        self.outcome.clear();
    }

    pub fn record_result(&mut self, outputs: ExecutionOutputs) {
        self.outcome.result = Some(outputs);
        self.outcome.error = None;
        self.outcome.completed_at = now_rfc3339();
    }

    pub fn record_error(&mut self, message: String) {
        self.outcome.error = Some(message);
        self.outcome.result = None;
        self.outcome.completed_at = None;
    }

    /// Full session reset: fresh form defaults, runtime back to NotReady,
    /// outcome cleared. The reload action in the presentation layer maps
    /// here.
    pub fn reset(&mut self) {
        self.form = FormState::default();
        self.runtime = RuntimeState::default();
        self.outcome.clear();
    }
}

fn now_rfc3339() -> Option<String> {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .ok()
}
