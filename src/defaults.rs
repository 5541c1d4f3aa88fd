//! Stock script sources the form starts out with.
//!
//! These are sample sources in the engine's assembly dialect. The playground
//! passes them through verbatim; only the engine ever parses them.

/// Sample target account id, pre-filled into the first note-input slot.
pub const DEFAULT_NOTE_INPUT: &str = "10376293541461622847";

pub const DEFAULT_NOTE_SCRIPT: &str = "\
use.miden::note
use.miden::contracts::wallets::basic->wallet

# Pay-to-id: spend the note's asset into the account named by input 0.
begin
    push.0 exec.note::get_inputs
    exec.note::get_assets
    exec.wallet::receive_asset
end
";

pub const DEFAULT_ACCOUNT_CODE: &str = "\
use.miden::account

export.incr_nonce
    push.1 exec.account::incr_nonce
end

export.set_item
    exec.account::set_item
end
";

pub const DEFAULT_TRANSACTION_SCRIPT: &str = "\
use.miden::contracts::auth::basic->auth_tx

begin
    exec.auth_tx::auth_tx_rpo_falcon512
end
";

/// Basic wallet library. Shown read-only in the UI; folded into the account
/// code when the wallet toggle is enabled.
pub const BASIC_WALLET_LIB: &str = "\
use.miden::account
use.miden::asset

export.receive_asset
    exec.account::add_asset
end

export.send_asset
    exec.account::remove_asset
    exec.asset::create_note
end
";

/// Basic authentication library, analogous to [`BASIC_WALLET_LIB`] for the
/// auth toggle.
pub const BASIC_AUTH_LIB: &str = "\
use.miden::account

export.auth_tx_rpo_falcon512
    exec.account::get_item
    exec.account::incr_nonce
end
";
