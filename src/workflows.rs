use bitcoin::consensus::encode::serialize;
use bitcoin::secp256k1::{All, PublicKey, Secp256k1};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::transactions::commitment::{build_commitment_transaction, htlc_witness_script};
use crate::transactions::htlc::{build_htlc_success_transaction, build_htlc_timeout_transaction};
use crate::types::{
    ChannelBasepoints, ChannelParameters, CommitmentTransaction, CounterpartyView, Htlc,
    HtlcTransaction, HtlcTxKind, KeySet, Side,
};

// ============================================================================
// CROSS-CHECKED COMMITMENT BUILD
// ============================================================================

fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b.iter())
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

/// Build the commitment held by `perspective`, then rebuild it from the
/// counterparty's own record and require identical results.
///
/// The rebuild uses `counterparty`'s keys and HTLCs with the opener and
/// perspective relabelled to the counterparty's side. Balances stay
/// holder-relative. A wrong key or HTLC direction in either record fails with
/// `MismatchedPerspective`, where `offset` is the first differing byte of the
/// serialized transactions, or the transaction length when only the HTLC
/// output map differs.
pub fn build_commitment_cross_checked(
    params: &ChannelParameters,
    keys: &KeySet,
    feerate_per_kw: u32,
    to_self_msat: u64,
    to_other_msat: u64,
    htlcs: &[Htlc],
    counterparty: &CounterpartyView,
    commitment_number: u64,
    perspective: Side,
) -> Result<CommitmentTransaction> {
    let commitment = build_commitment_transaction(
        params,
        keys,
        feerate_per_kw,
        to_self_msat,
        to_other_msat,
        htlcs,
        commitment_number,
        perspective,
    )?;

    let mirrored = build_commitment_transaction(
        &params.mirrored(),
        &counterparty.keys,
        feerate_per_kw,
        to_self_msat,
        to_other_msat,
        &counterparty.htlcs,
        commitment_number,
        perspective.counterparty(),
    )?;

    check_same_commitment(&commitment, &mirrored)?;

    debug!(txid = %commitment.tx.compute_txid(), "commitment cross-checked");
    Ok(commitment)
}

fn check_same_commitment(
    commitment: &CommitmentTransaction,
    mirrored: &CommitmentTransaction,
) -> Result<()> {
    let tx_bytes = serialize(&commitment.tx);
    let mirrored_bytes = serialize(&mirrored.tx);

    if let Some(offset) = first_difference(&tx_bytes, &mirrored_bytes) {
        warn!(offset, "commitment differs between perspectives");
        return Err(Error::MismatchedPerspective { offset });
    }

    let ids = commitment.htlc_map.as_slice().iter().map(|e| e.map(|htlc| htlc.id));
    let mirrored_ids = mirrored.htlc_map.as_slice().iter().map(|e| e.map(|htlc| htlc.id));
    if !ids.eq(mirrored_ids) {
        warn!("htlc output map differs between perspectives");
        return Err(Error::MismatchedPerspective {
            offset: tx_bytes.len(),
        });
    }

    Ok(())
}

/// Derive the key set for `per_commitment_point` and build the cross-checked
/// commitment. `holder` is the basepoint set of `perspective`.
///
/// `counterparty_htlcs` is the counterparty's HTLC list labelled from its
/// side. Without it the holder's own list is relabelled.
pub fn build_commitment_from_basepoints(
    params: &ChannelParameters,
    per_commitment_point: &PublicKey,
    holder: &ChannelBasepoints,
    counterparty: &ChannelBasepoints,
    feerate_per_kw: u32,
    to_self_msat: u64,
    to_other_msat: u64,
    htlcs: &[Htlc],
    counterparty_htlcs: Option<&[Htlc]>,
    commitment_number: u64,
    perspective: Side,
    secp_ctx: &Secp256k1<All>,
) -> Result<(KeySet, CommitmentTransaction)> {
    let keys = KeySet::derive(per_commitment_point, holder, counterparty, secp_ctx)?;

    let view = match counterparty_htlcs {
        Some(counterparty_htlcs) => CounterpartyView {
            keys,
            htlcs: counterparty_htlcs.to_vec(),
        },
        None => CounterpartyView::relabelled(&keys, htlcs),
    };

    let commitment = build_commitment_cross_checked(
        params,
        &keys,
        feerate_per_kw,
        to_self_msat,
        to_other_msat,
        htlcs,
        &view,
        commitment_number,
        perspective,
    )?;

    Ok((keys, commitment))
}

// ============================================================================
// SECOND-STAGE TRANSACTIONS
// ============================================================================

/// The unsigned HTLC-timeout or HTLC-success transaction spending
/// `output_index` of `commitment`.
pub fn build_htlc_transaction_for_output(
    commitment: &CommitmentTransaction,
    keys: &KeySet,
    output_index: usize,
) -> Result<HtlcTransaction> {
    let htlc = *commitment
        .htlc_map
        .get(output_index)
        .ok_or(Error::NotAnHtlcOutput(output_index))?;
    let vout = u32::try_from(output_index).map_err(|_| Error::NotAnHtlcOutput(output_index))?;
    let commitment_txid = commitment.tx.compute_txid();

    let (kind, tx) = if htlc.is_offered_by(commitment.perspective) {
        let tx = build_htlc_timeout_transaction(
            commitment_txid,
            vout,
            htlc.amount_msat,
            htlc.cltv_expiry,
            commitment.to_self_delay,
            commitment.feerate_per_kw,
            keys,
        )?;
        (HtlcTxKind::Timeout, tx)
    } else {
        let tx = build_htlc_success_transaction(
            commitment_txid,
            vout,
            htlc.amount_msat,
            commitment.to_self_delay,
            commitment.feerate_per_kw,
            keys,
        )?;
        (HtlcTxKind::Success, tx)
    };

    Ok(HtlcTransaction {
        kind,
        commitment_output_index: output_index,
        htlc,
        tx,
        witness_script: htlc_witness_script(keys, &htlc, commitment.perspective),
    })
}

/// One second-stage transaction per HTLC output, in output order.
pub fn build_htlc_transactions(
    commitment: &CommitmentTransaction,
    keys: &KeySet,
) -> Result<Vec<HtlcTransaction>> {
    commitment
        .htlc_map
        .htlc_outputs()
        .map(|(output_index, _)| build_htlc_transaction_for_output(commitment, keys, output_index))
        .collect()
}
