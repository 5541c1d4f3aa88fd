//! Pure transformation from form state to engine arguments.
//!
//! Validation lives on the editing path (`sanitize_digit_field`, applied per
//! keystroke by the session setters) rather than at submit time, so
//! `build_args` failing on a numeric field means the value bypassed the
//! sanitizer or overflowed 64 bits.

use crate::error::PlaygroundError;
use crate::model::{ExecutionArgs, FormState, NOTE_INPUT_SLOTS};

/// Returns `raw` unchanged if it consists of zero or more decimal digits,
/// otherwise `"0"`. Total: every keystroke maps to a valid field value.
pub fn sanitize_digit_field(raw: &str) -> String {
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.to_string()
    } else {
        "0".to_string()
    }
}

/// Build the engine argument tuple from the current form.
///
/// Empty note-input slots are dropped (absent, not zero), non-empty slots are
/// parsed as u64 preserving order, and the sequence is capped at
/// [`NOTE_INPUT_SLOTS`] values. Script fields pass through unchanged; the
/// engine owns their parsing.
pub fn build_args(form: &FormState) -> Result<ExecutionArgs, PlaygroundError> {
    let mut note_inputs = Vec::with_capacity(NOTE_INPUT_SLOTS);
    for (i, slot) in form.note_inputs.iter().enumerate() {
        let trimmed = slot.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = parse_u64(trimmed, format!("note input {}", i + 1))?;
        note_inputs.push(value);
    }
    note_inputs.truncate(NOTE_INPUT_SLOTS);

    let asset_amount = match form.asset_amount.trim() {
        "" => None,
        trimmed => Some(parse_u64(trimmed, "asset amount".to_string())?),
    };

    Ok(ExecutionArgs {
        account_code: form.account_code.clone(),
        note_script: form.note_script.clone(),
        note_inputs,
        transaction_script: form.transaction_script.clone(),
        asset_amount,
        wallet_enabled: form.wallet_enabled,
        auth_enabled: form.auth_enabled,
    })
}

fn parse_u64(raw: &str, field: String) -> Result<u64, PlaygroundError> {
    raw.parse::<u64>()
        .map_err(|_| PlaygroundError::InvalidNumericInput {
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with_inputs(inputs: [&str; NOTE_INPUT_SLOTS]) -> FormState {
        FormState {
            note_inputs: inputs.map(str::to_string),
            ..FormState::default()
        }
    }

    #[test]
    fn sanitize_keeps_digit_strings_unchanged() {
        assert_eq!(sanitize_digit_field(""), "");
        assert_eq!(sanitize_digit_field("0"), "0");
        assert_eq!(sanitize_digit_field("10376293541461622847"), "10376293541461622847");
    }

    #[test]
    fn sanitize_coerces_anything_else_to_zero() {
        assert_eq!(sanitize_digit_field("12a3"), "0");
        assert_eq!(sanitize_digit_field("-1"), "0");
        assert_eq!(sanitize_digit_field("1.5"), "0");
        assert_eq!(sanitize_digit_field(" 12"), "0");
    }

    #[test]
    fn empty_slots_produce_an_empty_sequence() {
        let form = form_with_inputs(["", "", "", ""]);
        let args = build_args(&form).unwrap();
        assert!(args.note_inputs.is_empty());
    }

    #[test]
    fn empty_slots_are_dropped_not_zeroed() {
        let form = form_with_inputs(["7", "", "9", ""]);
        let args = build_args(&form).unwrap();
        assert_eq!(args.note_inputs, vec![7, 9]);
    }

    #[test]
    fn slot_values_are_trimmed_before_parsing() {
        let form = form_with_inputs([" 42 ", "", "", ""]);
        let args = build_args(&form).unwrap();
        assert_eq!(args.note_inputs, vec![42]);
    }

    #[test]
    fn never_more_than_four_inputs() {
        let form = form_with_inputs(["1", "2", "3", "4"]);
        let args = build_args(&form).unwrap();
        assert_eq!(args.note_inputs.len(), NOTE_INPUT_SLOTS);
    }

    #[test]
    fn overflowing_digit_string_is_invalid_numeric_input() {
        // All digits, so it passes the sanitizer, but exceeds u64.
        let form = form_with_inputs(["99999999999999999999999", "", "", ""]);
        let err = build_args(&form).unwrap_err();
        assert!(matches!(
            err,
            PlaygroundError::InvalidNumericInput { .. }
        ));
    }

    #[test]
    fn injected_non_digit_value_is_invalid_numeric_input() {
        let mut form = FormState::default();
        form.asset_amount = "12a3".to_string();
        let err = build_args(&form).unwrap_err();
        assert!(matches!(err, PlaygroundError::InvalidNumericInput { field, .. } if field == "asset amount"));
    }

    #[test]
    fn empty_asset_amount_is_absent() {
        let mut form = FormState::default();
        form.asset_amount = String::new();
        assert_eq!(build_args(&form).unwrap().asset_amount, None);

        form.asset_amount = "100".to_string();
        assert_eq!(build_args(&form).unwrap().asset_amount, Some(100));
    }

    #[test]
    fn scripts_and_toggles_pass_through_unchanged() {
        let mut form = FormState::default();
        form.note_script = String::new();
        form.wallet_enabled = false;
        let args = build_args(&form).unwrap();
        assert_eq!(args.note_script, "");
        assert_eq!(args.account_code, form.account_code);
        assert_eq!(args.transaction_script, form.transaction_script);
        assert!(!args.wallet_enabled);
        assert!(args.auth_enabled);
    }
}
