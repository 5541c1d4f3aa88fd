use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::defaults;

/// The form exposes exactly this many note-input slots.
pub const NOTE_INPUT_SLOTS: usize = 4;

/// User-editable snapshot of the playground form.
///
/// Script fields are free-form source text with no length limit; empty text
/// is valid as far as the form is concerned (the engine decides whether it
/// can compile it). Numeric fields hold decimal-digit strings or the empty
/// string; the session setters keep that invariant on every edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub note_script: String,
    pub account_code: String,
    pub transaction_script: String,
    pub note_inputs: [String; NOTE_INPUT_SLOTS],
    pub asset_amount: String,
    pub wallet_enabled: bool,
    pub auth_enabled: bool,
}

impl Default for FormState {
    fn default() -> Self {
        let mut note_inputs: [String; NOTE_INPUT_SLOTS] = Default::default();
        // Pre-filled with the sample target account id, matching the
        // playground's stock scripts.
        note_inputs[0] = defaults::DEFAULT_NOTE_INPUT.to_string();
        Self {
            note_script: defaults::DEFAULT_NOTE_SCRIPT.to_string(),
            account_code: defaults::DEFAULT_ACCOUNT_CODE.to_string(),
            transaction_script: defaults::DEFAULT_TRANSACTION_SCRIPT.to_string(),
            note_inputs,
            asset_amount: String::new(),
            wallet_enabled: true,
            auth_enabled: true,
        }
    }
}

/// Normalized argument tuple handed to the engine.
///
/// Constructed fresh per invocation by [`crate::normalize::build_args`],
/// never mutated afterwards, discarded once the call returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionArgs {
    pub account_code: String,
    pub note_script: String,
    /// At most [`NOTE_INPUT_SLOTS`] values, original slot order preserved.
    /// An empty slot is absent here, not zero.
    pub note_inputs: Vec<u64>,
    pub transaction_script: String,
    pub asset_amount: Option<u64>,
    pub wallet_enabled: bool,
    pub auth_enabled: bool,
}

/// Structured record returned by a successful engine call. All fields are
/// display-safe; the orchestration layer never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutputs {
    pub account_code_commitment: String,
    pub account_delta_nonce: String,
    pub account_delta_storage: String,
    pub account_delta_vault: String,
    pub account_hash: String,
    pub account_storage_commitment: String,
    pub account_vault_commitment: String,
    pub cycle_count: u64,
    pub trace_length: u64,
}

/// When the engine runtime gets initialized.
///
/// Two policies were observed in the original system's history and they are
/// deliberately kept separate: per-call re-initialization changes the latency
/// profile of every submission and must never be merged silently into the
/// startup policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum InitPolicy {
    /// Initialize once when the session starts; submissions before readiness
    /// are rejected with `EngineNotReady`.
    Startup,
    /// Run the full initialization inside every submission, right before the
    /// engine call.
    PerCall,
}
