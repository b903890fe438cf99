//! JSON channel-state files for the command line tool.
//!
//! Public keys and payment hashes are hex strings, the funding txid is in the
//! usual display (reversed) byte order, and sides are `"local"` or `"remote"`.

use std::fs;
use std::path::Path;

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::PublicKey;
use bitcoin::{OutPoint, Txid};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ChannelBasepoints, ChannelParameters, Htlc, Side};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read channel state file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed channel state: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid public key: {0}")]
    Key(#[from] bitcoin::secp256k1::Error),
    #[error("{field} must be {expected} bytes, got {actual}")]
    Length {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasepointsFile {
    pub revocation_basepoint: String,
    pub payment_basepoint: String,
    pub delayed_payment_basepoint: String,
    pub htlc_basepoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtlcFile {
    pub id: u64,
    pub amount_msat: u64,
    pub cltv_expiry: u32,
    pub payment_hash: String,
    pub offerer: Side,
}

/// On-disk form of one commitment's inputs, as seen by `perspective`.
///
/// `holder` holds the basepoints of `perspective`, `counterparty` those of
/// the other party. `to_self_msat` is likewise the holder's balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStateFile {
    pub funding_txid: String,
    pub funding_output_index: u32,
    pub funding_amount_sat: u64,
    pub opener: Side,
    pub perspective: Side,
    pub to_self_delay: u16,
    pub dust_limit_sat: u64,
    pub feerate_per_kw: u32,
    pub to_self_msat: u64,
    pub to_other_msat: u64,
    pub commitment_number: u64,
    pub per_commitment_point: String,
    pub holder: BasepointsFile,
    pub counterparty: BasepointsFile,
    #[serde(default)]
    pub htlcs: Vec<HtlcFile>,
    /// The counterparty's HTLC list, sides labelled from its end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_htlcs: Option<Vec<HtlcFile>>,
}

/// Typed inputs for one commitment build.
#[derive(Debug, Clone)]
pub struct ChannelState {
    pub params: ChannelParameters,
    pub perspective: Side,
    pub feerate_per_kw: u32,
    pub to_self_msat: u64,
    pub to_other_msat: u64,
    pub commitment_number: u64,
    pub per_commitment_point: PublicKey,
    pub holder: ChannelBasepoints,
    pub counterparty: ChannelBasepoints,
    pub htlcs: Vec<Htlc>,
    pub counterparty_htlcs: Option<Vec<Htlc>>,
}

fn decode_fixed<const N: usize>(field: &'static str, value: &str) -> Result<[u8; N], ConfigError> {
    let bytes = hex::decode(value)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| ConfigError::Length {
        field,
        expected: N,
        actual: bytes.len(),
    })
}

pub fn parse_public_key(field: &'static str, value: &str) -> Result<PublicKey, ConfigError> {
    let bytes = decode_fixed::<33>(field, value)?;
    Ok(PublicKey::from_slice(&bytes)?)
}

fn parse_txid(value: &str) -> Result<Txid, ConfigError> {
    let mut bytes = decode_fixed::<32>("funding_txid", value)?;
    bytes.reverse();
    Ok(Txid::from_byte_array(bytes))
}

impl BasepointsFile {
    pub fn to_basepoints(&self) -> Result<ChannelBasepoints, ConfigError> {
        Ok(ChannelBasepoints {
            revocation_basepoint: parse_public_key(
                "revocation_basepoint",
                &self.revocation_basepoint,
            )?,
            payment_basepoint: parse_public_key("payment_basepoint", &self.payment_basepoint)?,
            delayed_payment_basepoint: parse_public_key(
                "delayed_payment_basepoint",
                &self.delayed_payment_basepoint,
            )?,
            htlc_basepoint: parse_public_key("htlc_basepoint", &self.htlc_basepoint)?,
        })
    }
}

impl HtlcFile {
    pub fn to_htlc(&self) -> Result<Htlc, ConfigError> {
        Ok(Htlc {
            id: self.id,
            amount_msat: self.amount_msat,
            cltv_expiry: self.cltv_expiry,
            payment_hash: decode_fixed::<32>("payment_hash", &self.payment_hash)?,
            offerer: self.offerer,
        })
    }
}

fn parse_htlcs(htlcs: &[HtlcFile]) -> Result<Vec<Htlc>, ConfigError> {
    htlcs.iter().map(HtlcFile::to_htlc).collect()
}

impl ChannelStateFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn to_channel_state(&self) -> Result<ChannelState, ConfigError> {
        let holder = self.holder.to_basepoints()?;
        let counterparty = self.counterparty.to_basepoints()?;

        let (opener_payment_basepoint, accepter_payment_basepoint) =
            if self.opener == self.perspective {
                (holder.payment_basepoint, counterparty.payment_basepoint)
            } else {
                (counterparty.payment_basepoint, holder.payment_basepoint)
            };

        let params = ChannelParameters {
            funding_outpoint: OutPoint::new(
                parse_txid(&self.funding_txid)?,
                self.funding_output_index,
            ),
            funding_amount_sat: self.funding_amount_sat,
            opener: self.opener,
            to_self_delay: self.to_self_delay,
            dust_limit_sat: self.dust_limit_sat,
            opener_payment_basepoint,
            accepter_payment_basepoint,
        };

        let htlcs = parse_htlcs(&self.htlcs)?;
        let counterparty_htlcs = self
            .counterparty_htlcs
            .as_deref()
            .map(parse_htlcs)
            .transpose()?;

        Ok(ChannelState {
            params,
            perspective: self.perspective,
            feerate_per_kw: self.feerate_per_kw,
            to_self_msat: self.to_self_msat,
            to_other_msat: self.to_other_msat,
            commitment_number: self.commitment_number,
            per_commitment_point: parse_public_key(
                "per_commitment_point",
                &self.per_commitment_point,
            )?,
            holder,
            counterparty,
            htlcs,
            counterparty_htlcs,
        })
    }
}
