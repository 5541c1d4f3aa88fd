//! Bundled deterministic engine so the playground runs standalone.
//!
//! Commitments are domain-tagged SHA-256 digests over the submitted sources
//! and inputs, and the cycle count is a size-based estimate. None of this is
//! contract: the orchestration layer only ever sees the trait.

use sha2::{Digest, Sha256};

use super::TransactionEngine;
use crate::defaults;
use crate::error::EngineError;
use crate::model::{ExecutionArgs, ExecutionOutputs};

/// Base cost charged for the kernel prologue/epilogue.
const KERNEL_BASE_CYCLES: u64 = 64;

pub struct LocalEngine;

impl TransactionEngine for LocalEngine {
    fn initialize(&self) -> Result<(), EngineError> {
        // Nothing to load for the in-process engine; a wasm-backed engine
        // would do its module instantiation here.
        Ok(())
    }

    fn execute(&self, args: &ExecutionArgs) -> Result<ExecutionOutputs, EngineError> {
        if args.account_code.trim().is_empty() {
            return Err(EngineError::new("account code must not be empty"));
        }
        if args.note_script.trim().is_empty() {
            return Err(EngineError::new("note script must not be empty"));
        }
        if args.transaction_script.trim().is_empty() {
            return Err(EngineError::new("transaction script must not be empty"));
        }

        // The toggles extend the account code with the stock libraries, the
        // same way the original playground injects them into the call.
        let mut code = args.account_code.clone();
        if args.wallet_enabled {
            code.push_str(defaults::BASIC_WALLET_LIB);
        }
        if args.auth_enabled {
            code.push_str(defaults::BASIC_AUTH_LIB);
        }

        let inputs_encoded: Vec<u8> = args
            .note_inputs
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let amount = args.asset_amount.unwrap_or(0);

        let code_commitment = digest("account-code", &[code.as_bytes()]);
        let storage_commitment = digest("account-storage", &[code.as_bytes(), &inputs_encoded]);
        let vault_commitment = digest("account-vault", &[&amount.to_le_bytes()]);
        let account_hash = digest(
            "account",
            &[
                code_commitment.as_bytes(),
                storage_commitment.as_bytes(),
                vault_commitment.as_bytes(),
            ],
        );

        let delta_storage = digest(
            "delta-storage",
            &[args.transaction_script.as_bytes(), &inputs_encoded],
        );
        let delta_vault = digest(
            "delta-vault",
            &[args.note_script.as_bytes(), &amount.to_le_bytes()],
        );

        let cycle_count = estimate_cycles(args, &code);
        let trace_length = cycle_count.next_power_of_two();

        Ok(ExecutionOutputs {
            account_code_commitment: code_commitment,
            account_delta_nonce: "1".to_string(),
            account_delta_storage: delta_storage,
            account_delta_vault: delta_vault,
            account_hash,
            account_storage_commitment: storage_commitment,
            account_vault_commitment: vault_commitment,
            cycle_count,
            trace_length,
        })
    }
}

/// Rough cycle estimate: kernel base cost plus per-byte and per-input costs.
fn estimate_cycles(args: &ExecutionArgs, code: &str) -> u64 {
    let script_bytes =
        (args.note_script.len() + args.transaction_script.len() + code.len()) as u64;
    KERNEL_BASE_CYCLES + script_bytes / 4 + args.note_inputs.len() as u64 * 8
}

fn digest(tag: &str, parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let bytes = hasher.finalize();
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::build_args;
    use crate::model::FormState;

    fn default_args() -> ExecutionArgs {
        build_args(&FormState::default()).unwrap()
    }

    #[test]
    fn execution_is_deterministic() {
        let engine = LocalEngine;
        let a = engine.execute(&default_args()).unwrap();
        let b = engine.execute(&default_args()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_note_script_is_rejected() {
        let engine = LocalEngine;
        let mut args = default_args();
        args.note_script = String::new();
        let err = engine.execute(&args).unwrap_err();
        assert!(err.to_string().contains("note script"));
    }

    #[test]
    fn toggles_change_the_code_commitment() {
        let engine = LocalEngine;
        let with = engine.execute(&default_args()).unwrap();
        let mut args = default_args();
        args.wallet_enabled = false;
        let without = engine.execute(&args).unwrap();
        assert_ne!(with.account_code_commitment, without.account_code_commitment);
    }

    #[test]
    fn asset_amount_changes_the_vault_commitment() {
        let engine = LocalEngine;
        let base = engine.execute(&default_args()).unwrap();
        let mut args = default_args();
        args.asset_amount = Some(100);
        let funded = engine.execute(&args).unwrap();
        assert_ne!(base.account_vault_commitment, funded.account_vault_commitment);
    }

    #[test]
    fn trace_length_is_a_power_of_two_covering_the_cycles() {
        let engine = LocalEngine;
        let out = engine.execute(&default_args()).unwrap();
        assert!(out.cycle_count >= KERNEL_BASE_CYCLES);
        assert!(out.trace_length.is_power_of_two());
        assert!(out.trace_length >= out.cycle_count);
    }
}
