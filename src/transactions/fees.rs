// ============================================================================
// FEE CALCULATIONS
// ============================================================================
// All fees are `weight * feerate_per_kw / 1000`, rounded down.

use crate::error::{Error, Result};
use crate::types::{Htlc, Side};

pub const COMMITMENT_TX_BASE_WEIGHT: u64 = 724;
pub const COMMITMENT_TX_WEIGHT_PER_HTLC: u64 = 172;
pub const HTLC_TIMEOUT_TX_WEIGHT: u64 = 663;
pub const HTLC_SUCCESS_TX_WEIGHT: u64 = 703;

fn fee_for_weight(weight: u64, feerate_per_kw: u32) -> Result<u64> {
    weight
        .checked_mul(feerate_per_kw as u64)
        .map(|fee| fee / 1000)
        .ok_or(Error::ArithmeticOverflow("fee"))
}

/// Weight = 724 + 172 * num_untrimmed_htlcs
pub fn commitment_tx_weight(num_untrimmed_htlcs: usize) -> Result<u64> {
    (num_untrimmed_htlcs as u64)
        .checked_mul(COMMITMENT_TX_WEIGHT_PER_HTLC)
        .and_then(|htlc_weight| htlc_weight.checked_add(COMMITMENT_TX_BASE_WEIGHT))
        .ok_or(Error::ArithmeticOverflow("commitment weight"))
}

pub fn commitment_tx_base_fee(feerate_per_kw: u32, num_untrimmed_htlcs: usize) -> Result<u64> {
    fee_for_weight(commitment_tx_weight(num_untrimmed_htlcs)?, feerate_per_kw)
}

pub fn htlc_timeout_tx_fee(feerate_per_kw: u32) -> Result<u64> {
    fee_for_weight(HTLC_TIMEOUT_TX_WEIGHT, feerate_per_kw)
}

pub fn htlc_success_tx_fee(feerate_per_kw: u32) -> Result<u64> {
    fee_for_weight(HTLC_SUCCESS_TX_WEIGHT, feerate_per_kw)
}

/// An HTLC is trimmed when its whole-satoshi amount cannot cover the dust
/// limit plus the fee of the second-stage transaction that would claim it.
///
/// HTLCs the holder offered are claimed by HTLC-timeout, the others by
/// HTLC-success.
pub fn is_htlc_trimmed(
    htlc: &Htlc,
    perspective: Side,
    feerate_per_kw: u32,
    dust_limit_satoshis: u64,
) -> Result<bool> {
    let htlc_tx_fee = if htlc.is_offered_by(perspective) {
        htlc_timeout_tx_fee(feerate_per_kw)?
    } else {
        htlc_success_tx_fee(feerate_per_kw)?
    };

    let threshold = dust_limit_satoshis
        .checked_add(htlc_tx_fee)
        .ok_or(Error::ArithmeticOverflow("trim threshold"))?;

    Ok(htlc.amount_sat() < threshold)
}
