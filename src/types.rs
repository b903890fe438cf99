use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::PublicKey;
use bitcoin::{OutPoint, Transaction};
use serde::{Deserialize, Serialize};

// ============================================================================
// CHANNEL SIDES
// ============================================================================

/// One of the two channel parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Local,
    Remote,
}

impl Side {
    pub fn counterparty(self) -> Side {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }
}

// ============================================================================
// KEY MATERIAL
// ============================================================================

/// The long-lived public basepoints one party contributes to a channel.
///
/// The HTLC basepoint is kept apart from the payment basepoint even though
/// the published test vectors set them equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBasepoints {
    pub revocation_basepoint: PublicKey,
    pub payment_basepoint: PublicKey,
    pub delayed_payment_basepoint: PublicKey,
    pub htlc_basepoint: PublicKey,
}

/// The six per-commitment keys needed to build one commitment view.
///
/// "self" is the holder of the commitment transaction (the party who would
/// broadcast it), "other" is its counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySet {
    /// Derived from the counterparty's revocation basepoint
    pub self_revocation_key: PublicKey,
    pub self_delayed_payment_key: PublicKey,
    /// Untweaked payment basepoints
    pub self_payment_key: PublicKey,
    pub other_payment_key: PublicKey,
    pub self_htlc_key: PublicKey,
    pub other_htlc_key: PublicKey,
}

// ============================================================================
// HTLCS
// ============================================================================

/// An in-flight HTLC as the channel state machine hands it to the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Htlc {
    pub id: u64,
    pub amount_msat: u64,
    /// Absolute expiry, as a block height
    pub cltv_expiry: u32,
    pub payment_hash: [u8; 32],
    /// The party that offered (added) the HTLC
    pub offerer: Side,
}

impl Htlc {
    /// The same HTLC as seen from the other side of the channel.
    pub fn inverted(&self) -> Htlc {
        Htlc {
            offerer: self.offerer.counterparty(),
            ..*self
        }
    }

    /// Whether the holder of a commitment built from `perspective` offered this HTLC.
    pub fn is_offered_by(&self, perspective: Side) -> bool {
        self.offerer == perspective
    }

    pub fn amount_sat(&self) -> u64 {
        self.amount_msat / 1000
    }
}

pub fn invert_htlcs(htlcs: &[Htlc]) -> Vec<Htlc> {
    htlcs.iter().map(Htlc::inverted).collect()
}

// ============================================================================
// CHANNEL PARAMETERS
// ============================================================================

/// Channel-wide values that stay fixed across commitment numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelParameters {
    pub funding_outpoint: OutPoint,
    pub funding_amount_sat: u64,
    /// The party paying the commitment transaction fee
    pub opener: Side,
    pub to_self_delay: u16,
    pub dust_limit_sat: u64,
    pub opener_payment_basepoint: PublicKey,
    pub accepter_payment_basepoint: PublicKey,
}

impl ChannelParameters {
    /// The same channel with the opener relabelled, for building the
    /// counterparty's view of a commitment.
    pub fn mirrored(&self) -> ChannelParameters {
        ChannelParameters {
            opener: self.opener.counterparty(),
            ..*self
        }
    }
}

/// The counterparty's own record of a commitment it does not hold.
///
/// `keys` is its key set for the holder's commitment and `htlcs` its HTLC
/// list, with every side labelled from the counterparty's end of the
/// channel. Building from this record must reproduce the holder's build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterpartyView {
    pub keys: KeySet,
    pub htlcs: Vec<Htlc>,
}

impl CounterpartyView {
    /// The record a counterparty sharing the holder's keys and HTLC list
    /// would keep.
    pub fn relabelled(keys: &KeySet, htlcs: &[Htlc]) -> CounterpartyView {
        CounterpartyView {
            keys: *keys,
            htlcs: invert_htlcs(htlcs),
        }
    }
}

// ============================================================================
// OUTPUT SORTING STRUCTURES
// ============================================================================

#[derive(Debug, Clone)]
pub struct OutputWithMetadata {
    pub value: u64,
    pub script: ScriptBuf,
    pub cltv_expiry: Option<u32>,
    pub htlc: Option<Htlc>,
}

/// Aligns each commitment output index with the HTLC it carries.
/// Balance outputs map to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtlcOutputMap(Vec<Option<Htlc>>);

impl HtlcOutputMap {
    pub fn new(entries: Vec<Option<Htlc>>) -> Self {
        HtlcOutputMap(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, output_index: usize) -> Option<&Htlc> {
        self.0.get(output_index).and_then(Option::as_ref)
    }

    /// `(output_index, htlc)` for every output carrying an HTLC, in output order.
    pub fn htlc_outputs(&self) -> impl Iterator<Item = (usize, &Htlc)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|htlc| (index, htlc)))
    }

    pub fn as_slice(&self) -> &[Option<Htlc>] {
        &self.0
    }
}

// ============================================================================
// BUILT TRANSACTIONS
// ============================================================================

/// An unsigned commitment transaction together with what callers need to
/// sign it and to claim its HTLC outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentTransaction {
    pub tx: Transaction,
    pub htlc_map: HtlcOutputMap,
    pub perspective: Side,
    pub feerate_per_kw: u32,
    pub to_self_delay: u16,
    /// Weight-based fee charged to the opener
    pub base_fee_sat: u64,
    /// Funding amount minus all outputs, including trimmed HTLC value
    pub actual_fee_sat: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtlcTxKind {
    Timeout,
    Success,
}

/// A second-stage transaction spending one HTLC output of a commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtlcTransaction {
    pub kind: HtlcTxKind,
    pub commitment_output_index: usize,
    pub htlc: Htlc,
    pub tx: Transaction,
    /// The offered or received HTLC script the input spends
    pub witness_script: ScriptBuf,
}
