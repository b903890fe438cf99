use bitcoin::hashes::sha256::Hash as Sha256;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{All, PublicKey, Secp256k1, SecretKey};

use crate::error::{Error, Result};
use crate::types::ChannelBasepoints;
use crate::INITIAL_COMMITMENT_NUMBER;

/// BOLT #3 per-commitment secret generation from a 32-byte seed.
///
/// `index` counts down from 2^48 - 1; only its low 48 bits are used.
pub fn build_commitment_secret(seed: &[u8; 32], index: u64) -> [u8; 32] {
    let mut p: [u8; 32] = *seed;
    for bit_position in (0..48).rev() {
        if index & (1 << bit_position) == (1 << bit_position) {
            p[bit_position / 8] ^= 1 << (bit_position & 7);
            p = Sha256::hash(&p).to_byte_array();
        }
    }
    p
}

/// Secret for commitment number `commitment_number` (0 is the first commitment).
pub fn per_commitment_secret(seed: &[u8; 32], commitment_number: u64) -> Result<[u8; 32]> {
    let index = INITIAL_COMMITMENT_NUMBER
        .checked_sub(commitment_number)
        .ok_or(Error::CommitmentNumberOutOfRange(commitment_number))?;
    Ok(build_commitment_secret(seed, index))
}

/// Everything one party keeps private for a channel.
#[derive(Clone)]
pub struct ChannelSecrets {
    pub funding_key: SecretKey,
    pub revocation_basepoint_secret: SecretKey,
    pub payment_basepoint_secret: SecretKey,
    pub delayed_payment_basepoint_secret: SecretKey,
    pub htlc_basepoint_secret: SecretKey,
    pub commitment_seed: [u8; 32],
}

impl ChannelSecrets {
    pub fn funding_pubkey(&self, secp_ctx: &Secp256k1<All>) -> PublicKey {
        PublicKey::from_secret_key(secp_ctx, &self.funding_key)
    }

    pub fn basepoints(&self, secp_ctx: &Secp256k1<All>) -> ChannelBasepoints {
        ChannelBasepoints {
            revocation_basepoint: PublicKey::from_secret_key(
                secp_ctx,
                &self.revocation_basepoint_secret,
            ),
            payment_basepoint: PublicKey::from_secret_key(secp_ctx, &self.payment_basepoint_secret),
            delayed_payment_basepoint: PublicKey::from_secret_key(
                secp_ctx,
                &self.delayed_payment_basepoint_secret,
            ),
            htlc_basepoint: PublicKey::from_secret_key(secp_ctx, &self.htlc_basepoint_secret),
        }
    }

    pub fn per_commitment_secret(&self, commitment_number: u64) -> Result<SecretKey> {
        let secret = per_commitment_secret(&self.commitment_seed, commitment_number)?;
        SecretKey::from_slice(&secret).map_err(|_| Error::InvalidPoint)
    }

    pub fn per_commitment_point(
        &self,
        commitment_number: u64,
        secp_ctx: &Secp256k1<All>,
    ) -> Result<PublicKey> {
        let secret_key = self.per_commitment_secret(commitment_number)?;
        Ok(PublicKey::from_secret_key(secp_ctx, &secret_key))
    }
}
