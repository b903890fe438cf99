use bitcoin::hashes::sha256::Hash as Sha256;
use bitcoin::hashes::{Hash, HashEngine};
use bitcoin::locktime::absolute::LockTime;
use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::PublicKey;
use bitcoin::transaction::Version;
use bitcoin::{Amount, Sequence, Transaction, TxIn, TxOut, Witness};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::scripts::{create_funding_witness, create_offered_htlc_script, create_received_htlc_script};
use crate::scripts::{create_to_local_script, create_to_remote_script};
use crate::transactions::fees::{commitment_tx_base_fee, is_htlc_trimmed};
use crate::types::{
    ChannelParameters, CommitmentTransaction, Htlc, HtlcOutputMap, KeySet, OutputWithMetadata,
    Side,
};
use crate::INITIAL_COMMITMENT_NUMBER;

// ============================================================================
// OBSCURED COMMITMENT NUMBER
// ============================================================================

/// Lower 48 bits of SHA256(opener_payment_basepoint || accepter_payment_basepoint).
///
/// The basepoints are ordered by channel role, never by perspective, so both
/// parties compute the same value.
pub fn commitment_number_obscurer(
    opener_payment_basepoint: &PublicKey,
    accepter_payment_basepoint: &PublicKey,
) -> u64 {
    let mut sha = Sha256::engine();

    sha.input(&opener_payment_basepoint.serialize());
    sha.input(&accepter_payment_basepoint.serialize());

    let res = Sha256::from_engine(sha).to_byte_array();

    ((res[26] as u64) << 5 * 8)
        | ((res[27] as u64) << 4 * 8)
        | ((res[28] as u64) << 3 * 8)
        | ((res[29] as u64) << 2 * 8)
        | ((res[30] as u64) << 1 * 8)
        | ((res[31] as u64) << 0 * 8)
}

/// Lower 24 bits of the obscured number go in the locktime (upper byte 0x20),
/// upper 24 bits in the input sequence (upper byte 0x80).
pub fn set_obscured_commitment_number(tx: &mut Transaction, obscured_commitment_number: u64) {
    let locktime_value =
        ((0x20 as u32) << 8 * 3) | ((obscured_commitment_number & 0xffffff) as u32);
    tx.lock_time = LockTime::from_consensus(locktime_value);

    let sequence_value = Sequence(
        ((0x80 as u32) << 8 * 3) | (((obscured_commitment_number >> 3 * 8) & 0xffffff) as u32),
    );
    for input in tx.input.iter_mut() {
        input.sequence = sequence_value;
    }
}

/// Recover the obscured commitment number from a broadcast commitment transaction.
pub fn obscured_commitment_number(tx: &Transaction) -> Option<u64> {
    let input = tx.input.first()?;
    let locktime = tx.lock_time.to_consensus_u32();
    let sequence = input.sequence.0;
    if locktime >> 24 != 0x20 || sequence >> 24 != 0x80 {
        return None;
    }
    Some((((sequence & 0xffffff) as u64) << 24) | (locktime & 0xffffff) as u64)
}

// ============================================================================
// OUTPUTS
// ============================================================================

/// The witness script locking `htlc`'s output on a commitment held by `perspective`.
pub fn htlc_witness_script(keys: &KeySet, htlc: &Htlc, perspective: Side) -> ScriptBuf {
    if htlc.is_offered_by(perspective) {
        create_offered_htlc_script(
            &keys.self_revocation_key,
            &keys.self_htlc_key,
            &keys.other_htlc_key,
            &htlc.payment_hash,
        )
    } else {
        create_received_htlc_script(
            &keys.self_revocation_key,
            &keys.self_htlc_key,
            &keys.other_htlc_key,
            &htlc.payment_hash,
            htlc.cltv_expiry,
        )
    }
}

/// to_local and to_remote outputs; each is omitted when below the dust limit.
pub fn create_commitment_transaction_outputs(
    to_self_value: u64,
    to_other_value: u64,
    keys: &KeySet,
    to_self_delay: u16,
    dust_limit_satoshis: u64,
) -> Vec<OutputWithMetadata> {
    let mut outputs = Vec::new();

    if to_self_value >= dust_limit_satoshis {
        let to_local_script = create_to_local_script(
            &keys.self_revocation_key,
            &keys.self_delayed_payment_key,
            to_self_delay,
        );
        trace!(
            amount = to_self_value,
            wscript = %hex::encode(to_local_script.as_bytes()),
            "to-local output"
        );
        outputs.push(OutputWithMetadata {
            value: to_self_value,
            script: to_local_script.to_p2wsh(),
            cltv_expiry: None,
            htlc: None,
        });
    }

    if to_other_value >= dust_limit_satoshis {
        trace!(
            amount = to_other_value,
            key = %keys.other_payment_key,
            "to-remote output"
        );
        outputs.push(OutputWithMetadata {
            value: to_other_value,
            script: create_to_remote_script(&keys.other_payment_key),
            cltv_expiry: None,
            htlc: None,
        });
    }

    outputs
}

/// One P2WSH output per untrimmed HTLC.
pub fn create_htlc_outputs(
    keys: &KeySet,
    untrimmed_htlcs: &[Htlc],
    perspective: Side,
) -> Vec<OutputWithMetadata> {
    untrimmed_htlcs
        .iter()
        .map(|htlc| {
            let script = htlc_witness_script(keys, htlc, perspective);
            trace!(
                htlc_id = htlc.id,
                offered = htlc.is_offered_by(perspective),
                amount = htlc.amount_sat(),
                wscript = %hex::encode(script.as_bytes()),
                "htlc output"
            );
            OutputWithMetadata {
                value: htlc.amount_sat(),
                script: script.to_p2wsh(),
                cltv_expiry: Some(htlc.cltv_expiry),
                htlc: Some(*htlc),
            }
        })
        .collect()
}

/// BIP69 order on (value, scriptPubKey), then CLTV expiry and payment hash so
/// that HTLCs with identical outputs still land in a fixed order.
pub fn sort_outputs(outputs: &mut [OutputWithMetadata]) {
    outputs.sort_by(|a, b| {
        a.value
            .cmp(&b.value)
            .then_with(|| a.script.cmp(&b.script))
            .then_with(|| a.cltv_expiry.cmp(&b.cltv_expiry))
            .then_with(|| {
                let a_hash = a.htlc.map(|htlc| htlc.payment_hash);
                let b_hash = b.htlc.map(|htlc| htlc.payment_hash);
                a_hash.cmp(&b_hash)
            })
    });
}

// ============================================================================
// COMMITMENT TRANSACTION
// ============================================================================

fn check_channel_state(
    params: &ChannelParameters,
    to_self_msat: u64,
    to_other_msat: u64,
    htlcs: &[Htlc],
) -> Result<()> {
    let total_msat = htlcs
        .iter()
        .try_fold(to_self_msat, |total, htlc| total.checked_add(htlc.amount_msat))
        .and_then(|total| total.checked_add(to_other_msat))
        .ok_or(Error::ArithmeticOverflow("channel balance"))?;
    let funding_msat = params
        .funding_amount_sat
        .checked_mul(1000)
        .ok_or(Error::ArithmeticOverflow("funding amount"))?;

    if total_msat > funding_msat {
        return Err(Error::ExceedsFunding {
            total_msat,
            funding_msat,
        });
    }
    Ok(())
}

/// Take the fee from the opener's balance, flooring at zero. The other
/// balance is never touched.
fn subtract_fee_from_opener(
    opener_is_self: bool,
    base_fee_msat: u64,
    to_self_msat: u64,
    to_other_msat: u64,
) -> (u64, u64) {
    if opener_is_self {
        (to_self_msat.saturating_sub(base_fee_msat), to_other_msat)
    } else {
        (to_self_msat, to_other_msat.saturating_sub(base_fee_msat))
    }
}

/// Build the unsigned commitment transaction held by `perspective`.
///
/// `to_self_msat` is the holder's balance and `to_other_msat` its
/// counterparty's, both before fees. HTLC directions are taken from each
/// HTLC's `offerer` relative to `perspective`.
pub fn build_commitment_transaction(
    params: &ChannelParameters,
    keys: &KeySet,
    feerate_per_kw: u32,
    to_self_msat: u64,
    to_other_msat: u64,
    htlcs: &[Htlc],
    commitment_number: u64,
    perspective: Side,
) -> Result<CommitmentTransaction> {
    if commitment_number > INITIAL_COMMITMENT_NUMBER {
        return Err(Error::CommitmentNumberOutOfRange(commitment_number));
    }
    check_channel_state(params, to_self_msat, to_other_msat, htlcs)?;

    let mut untrimmed_htlcs = Vec::with_capacity(htlcs.len());
    for htlc in htlcs {
        if !is_htlc_trimmed(htlc, perspective, feerate_per_kw, params.dust_limit_sat)? {
            untrimmed_htlcs.push(*htlc);
        }
    }

    let base_fee_sat = commitment_tx_base_fee(feerate_per_kw, untrimmed_htlcs.len())?;
    let base_fee_msat = base_fee_sat
        .checked_mul(1000)
        .ok_or(Error::ArithmeticOverflow("base fee"))?;
    trace!(base_fee_sat, "base commitment transaction fee");

    let (to_self_msat, to_other_msat) = subtract_fee_from_opener(
        params.opener == perspective,
        base_fee_msat,
        to_self_msat,
        to_other_msat,
    );

    let mut output_metadata = create_htlc_outputs(keys, &untrimmed_htlcs, perspective);
    output_metadata.extend(create_commitment_transaction_outputs(
        to_self_msat / 1000,
        to_other_msat / 1000,
        keys,
        params.to_self_delay,
        params.dust_limit_sat,
    ));

    sort_outputs(&mut output_metadata);

    let htlc_map = HtlcOutputMap::new(output_metadata.iter().map(|meta| meta.htlc).collect());

    let outputs: Vec<TxOut> = output_metadata
        .iter()
        .map(|meta| TxOut {
            value: Amount::from_sat(meta.value),
            script_pubkey: meta.script.clone(),
        })
        .collect();

    let outputs_sat = output_metadata
        .iter()
        .try_fold(0u64, |total, meta| total.checked_add(meta.value))
        .ok_or(Error::ArithmeticOverflow("output total"))?;
    let actual_fee_sat = params
        .funding_amount_sat
        .checked_sub(outputs_sat)
        .ok_or(Error::ArithmeticOverflow("actual fee"))?;
    trace!(actual_fee_sat, "actual commitment transaction fee");

    let mut tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: params.funding_outpoint,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: outputs,
    };

    let obscurer = commitment_number_obscurer(
        &params.opener_payment_basepoint,
        &params.accepter_payment_basepoint,
    );
    set_obscured_commitment_number(&mut tx, obscurer ^ commitment_number);

    debug!(
        commitment_number,
        ?perspective,
        feerate_per_kw,
        outputs = tx.output.len(),
        untrimmed_htlcs = untrimmed_htlcs.len(),
        trimmed_htlcs = htlcs.len() - untrimmed_htlcs.len(),
        "built commitment transaction"
    );

    Ok(CommitmentTransaction {
        tx,
        htlc_map,
        perspective,
        feerate_per_kw,
        to_self_delay: params.to_self_delay,
        base_fee_sat,
        actual_fee_sat,
    })
}

/// Attach the 2-of-2 funding witness to a built commitment transaction.
/// Signatures follow the key order of `funding_script`.
pub fn finalize_commitment_transaction(
    tx: &Transaction,
    funding_script: &ScriptBuf,
    first_signature: &[u8],
    second_signature: &[u8],
) -> Result<Transaction> {
    let mut signed_tx = tx.clone();
    let input = signed_tx.input.first_mut().ok_or(Error::InputIndex(0))?;
    input.witness = create_funding_witness(first_signature, second_signature, funding_script);
    Ok(signed_tx)
}
