use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::{LocalEngine, RuntimeHandle};
use crate::model::{FormState, InitPolicy, NOTE_INPUT_SLOTS};
use crate::orchestrator;
use crate::session::SessionState;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "tx-playground",
    version,
    about = "Playground for submitting scripts to a transaction execution engine"
)]
pub struct Cli {
    /// Read the note script from a file instead of the stock sample
    #[arg(long)]
    pub note_script: Option<PathBuf>,

    /// Read the account code from a file instead of the stock sample
    #[arg(long)]
    pub account_code: Option<PathBuf>,

    /// Read the transaction script from a file instead of the stock sample
    #[arg(long)]
    pub transaction_script: Option<PathBuf>,

    /// Note input values (decimal, comma separated, at most 4 are used)
    #[arg(long, value_delimiter = ',')]
    pub note_inputs: Vec<String>,

    /// Asset amount (decimal); omitted means no asset
    #[arg(long)]
    pub asset_amount: Option<String>,

    /// Use --wallet true or --wallet false to toggle the basic wallet library
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub wallet: bool,

    /// Use --auth true or --auth false to toggle the basic auth library
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auth: bool,

    /// When the engine runtime gets initialized
    #[arg(long, value_enum, default_value_t = InitPolicy::Startup)]
    pub init_policy: InitPolicy,

    /// Print JSON outputs and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Export outputs as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

pub async fn run(args: Cli) -> Result<()> {
    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_once(args, false).await;
        }
    }

    let json = args.json;
    run_once(args, json).await
}

/// Distribute CLI-supplied note inputs over the form's fixed slots. Values
/// beyond the slot count are dropped; remaining slots stay empty (absent).
fn fill_note_slots(values: &[String]) -> [String; NOTE_INPUT_SLOTS] {
    let mut slots: [String; NOTE_INPUT_SLOTS] = Default::default();
    for (slot, value) in slots.iter_mut().zip(values) {
        *slot = value.clone();
    }
    slots
}

/// Build the initial form from CLI arguments, falling back to the stock
/// samples. CLI values are the programmatic-injection path: they skip the
/// per-keystroke sanitizer and get validated at normalization instead.
pub fn build_form(args: &Cli) -> Result<FormState> {
    let mut form = FormState::default();
    if let Some(path) = args.note_script.as_deref() {
        form.note_script = std::fs::read_to_string(path)
            .with_context(|| format!("reading note script from {}", path.display()))?;
    }
    if let Some(path) = args.account_code.as_deref() {
        form.account_code = std::fs::read_to_string(path)
            .with_context(|| format!("reading account code from {}", path.display()))?;
    }
    if let Some(path) = args.transaction_script.as_deref() {
        form.transaction_script = std::fs::read_to_string(path)
            .with_context(|| format!("reading transaction script from {}", path.display()))?;
    }
    if !args.note_inputs.is_empty() {
        form.note_inputs = fill_note_slots(&args.note_inputs);
    }
    if let Some(amount) = args.asset_amount.as_deref() {
        form.asset_amount = amount.to_string();
    }
    form.wallet_enabled = args.wallet;
    form.auth_enabled = args.auth;
    Ok(form)
}

/// Headless mode: one submission, outputs printed as JSON or a text summary.
async fn run_once(args: Cli, json: bool) -> Result<()> {
    let form = build_form(&args)?;
    let runtime = RuntimeHandle::new(Arc::new(LocalEngine), args.init_policy);
    if args.init_policy == InitPolicy::Startup {
        runtime
            .initialize()
            .await
            .context("engine initialization failed")?;
    }

    let mut session = SessionState::new(form);
    session.set_runtime_ready(runtime.is_ready());

    session.begin_submission();
    match orchestrator::execute_once(&runtime, session.form()).await {
        Ok(outputs) => session.record_result(outputs),
        Err(e) => session.record_error(e.to_string()),
    }

    let Some(outputs) = session.outcome().result() else {
        let message = session
            .outcome()
            .error()
            .unwrap_or("execution produced no outcome")
            .to_string();
        return Err(anyhow!("{message}"));
    };

    if let Some(path) = args.export_json.as_deref() {
        let body = serde_json::to_string_pretty(outputs)?;
        std::fs::write(path, body)
            .with_context(|| format!("exporting outputs to {}", path.display()))?;
        eprintln!("Exported: {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(outputs)?);
    } else {
        for line in text_summary(outputs) {
            println!("{line}");
        }
        if let Some(ts) = session.outcome().completed_at() {
            eprintln!("Completed at {ts}");
        }
    }
    Ok(())
}

/// Labeled output lines, matching the result list the TUI renders.
pub fn text_summary(outputs: &crate::model::ExecutionOutputs) -> Vec<String> {
    vec![
        format!("Account Code Commitment: {}", outputs.account_code_commitment),
        format!("Account Delta Nonce: {}", outputs.account_delta_nonce),
        format!("Account Delta Storage: {}", outputs.account_delta_storage),
        format!("Account Delta Vault: {}", outputs.account_delta_vault),
        format!("Account Hash: {}", outputs.account_hash),
        format!(
            "Account Storage Commitment: {}",
            outputs.account_storage_commitment
        ),
        format!(
            "Account Vault Commitment: {}",
            outputs.account_vault_commitment
        ),
        format!("Cycle Count: {}", outputs.cycle_count),
        format!("Trace Length: {}", outputs.trace_length),
    ]
}
