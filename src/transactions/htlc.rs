use bitcoin::locktime::absolute::LockTime;
use bitcoin::script::ScriptBuf;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use tracing::trace;

use crate::error::{Error, Result};
use crate::scripts::create_to_local_script;
use crate::transactions::fees::{htlc_success_tx_fee, htlc_timeout_tx_fee};
use crate::types::KeySet;

/// Second-stage transaction skeleton shared by HTLC-timeout and HTLC-success:
/// one input spending the HTLC output with sequence 0, one output paying the
/// holder's delayed to_local script.
fn create_htlc_transaction(
    htlc_outpoint: OutPoint,
    output_amount: u64,
    lock_time: LockTime,
    keys: &KeySet,
    to_self_delay: u16,
) -> Transaction {
    let to_local_script = create_to_local_script(
        &keys.self_revocation_key,
        &keys.self_delayed_payment_key,
        to_self_delay,
    );

    Transaction {
        version: Version::TWO,
        lock_time,
        input: vec![TxIn {
            previous_output: htlc_outpoint,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ZERO,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(output_amount),
            script_pubkey: to_local_script.to_p2wsh(),
        }],
    }
}

fn htlc_output_amount(htlc_amount_msat: u64, fee: u64) -> Result<u64> {
    (htlc_amount_msat / 1000)
        .checked_sub(fee)
        .ok_or(Error::ArithmeticOverflow("htlc output amount"))
}

/// HTLC-timeout: spends an HTLC the holder offered once `cltv_expiry` is reached.
pub fn build_htlc_timeout_transaction(
    commitment_txid: Txid,
    output_index: u32,
    htlc_amount_msat: u64,
    cltv_expiry: u32,
    to_self_delay: u16,
    feerate_per_kw: u32,
    keys: &KeySet,
) -> Result<Transaction> {
    let fee = htlc_timeout_tx_fee(feerate_per_kw)?;
    let output_amount = htlc_output_amount(htlc_amount_msat, fee)?;
    trace!(output_index, fee, output_amount, cltv_expiry, "htlc-timeout transaction");

    Ok(create_htlc_transaction(
        OutPoint::new(commitment_txid, output_index),
        output_amount,
        LockTime::from_consensus(cltv_expiry),
        keys,
        to_self_delay,
    ))
}

/// HTLC-success: spends an HTLC the holder received, given its preimage.
pub fn build_htlc_success_transaction(
    commitment_txid: Txid,
    output_index: u32,
    htlc_amount_msat: u64,
    to_self_delay: u16,
    feerate_per_kw: u32,
    keys: &KeySet,
) -> Result<Transaction> {
    let fee = htlc_success_tx_fee(feerate_per_kw)?;
    let output_amount = htlc_output_amount(htlc_amount_msat, fee)?;
    trace!(output_index, fee, output_amount, "htlc-success transaction");

    Ok(create_htlc_transaction(
        OutPoint::new(commitment_txid, output_index),
        output_amount,
        LockTime::ZERO,
        keys,
        to_self_delay,
    ))
}

/// `[<>, remote_sig, local_sig, <>, htlc_script]`
pub fn create_htlc_timeout_witness(
    remote_htlc_signature: &[u8],
    local_htlc_signature: &[u8],
    htlc_script: &ScriptBuf,
) -> Witness {
    Witness::from_slice(&[
        &[][..],
        remote_htlc_signature,
        local_htlc_signature,
        &[][..],
        htlc_script.as_bytes(),
    ])
}

/// `[<>, remote_sig, local_sig, payment_preimage, htlc_script]`
pub fn create_htlc_success_witness(
    remote_htlc_signature: &[u8],
    local_htlc_signature: &[u8],
    payment_preimage: &[u8; 32],
    htlc_script: &ScriptBuf,
) -> Witness {
    Witness::from_slice(&[
        &[][..],
        remote_htlc_signature,
        local_htlc_signature,
        &payment_preimage[..],
        htlc_script.as_bytes(),
    ])
}

/// Attach `witness` to the single input of a second-stage transaction.
pub fn finalize_htlc_transaction(tx: &Transaction, witness: Witness) -> Result<Transaction> {
    let mut signed_tx = tx.clone();
    let input = signed_tx.input.first_mut().ok_or(Error::InputIndex(0))?;
    input.witness = witness;
    Ok(signed_tx)
}
