use bitcoin::hashes::sha256::Hash as Sha256;
use bitcoin::hashes::{Hash, HashEngine};
use bitcoin::secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};
use tracing::trace;

use crate::error::{Error, Result};
use crate::types::{ChannelBasepoints, KeySet};

// ============================================================================
// PER-COMMITMENT KEY DERIVATION
// ============================================================================

/// SHA256(first || second) as a curve scalar.
fn tweak_from_points(first: &PublicKey, second: &PublicKey) -> Result<Scalar> {
    let mut engine = Sha256::engine();
    engine.input(&first.serialize());
    engine.input(&second.serialize());
    let res = Sha256::from_engine(engine).to_byte_array();

    Scalar::from_be_bytes(res).map_err(|_| Error::InvalidPoint)
}

/// pubkey = basepoint + SHA256(per_commitment_point || basepoint) * G
pub fn derive_public_key(
    basepoint: &PublicKey,
    per_commitment_point: &PublicKey,
    secp_ctx: &Secp256k1<All>,
) -> Result<PublicKey> {
    let tweak = tweak_from_points(per_commitment_point, basepoint)?;

    basepoint
        .add_exp_tweak(secp_ctx, &tweak)
        .map_err(|_| Error::InvalidPoint)
}

/// privkey = basepoint_secret + SHA256(per_commitment_point || basepoint)
pub fn derive_private_key(
    basepoint_secret: &SecretKey,
    per_commitment_point: &PublicKey,
    secp_ctx: &Secp256k1<All>,
) -> Result<SecretKey> {
    let basepoint = PublicKey::from_secret_key(secp_ctx, basepoint_secret);
    let tweak = tweak_from_points(per_commitment_point, &basepoint)?;

    basepoint_secret
        .add_tweak(&tweak)
        .map_err(|_| Error::InvalidPoint)
}

// ============================================================================
// REVOCATION KEY DERIVATION
// ============================================================================
// Neither party can compute the revocation private key alone: it needs the
// revocation basepoint secret of one side and the per-commitment secret of the
// other.

/// revocationpubkey = revocation_basepoint * SHA256(revocation_basepoint || per_commitment_point)
///                  + per_commitment_point * SHA256(per_commitment_point || revocation_basepoint)
pub fn derive_revocation_public_key(
    revocation_basepoint: &PublicKey,
    per_commitment_point: &PublicKey,
    secp_ctx: &Secp256k1<All>,
) -> Result<PublicKey> {
    let basepoint_tweak = tweak_from_points(revocation_basepoint, per_commitment_point)?;
    let point_tweak = tweak_from_points(per_commitment_point, revocation_basepoint)?;

    let basepoint_component = revocation_basepoint
        .mul_tweak(secp_ctx, &basepoint_tweak)
        .map_err(|_| Error::InvalidPoint)?;
    let point_component = per_commitment_point
        .mul_tweak(secp_ctx, &point_tweak)
        .map_err(|_| Error::InvalidPoint)?;

    basepoint_component
        .combine(&point_component)
        .map_err(|_| Error::InvalidPoint)
}

/// Scalar counterpart of [`derive_revocation_public_key`], computable once the
/// counterparty has revealed `per_commitment_secret`.
pub fn derive_revocation_private_key(
    revocation_basepoint_secret: &SecretKey,
    per_commitment_secret: &SecretKey,
    secp_ctx: &Secp256k1<All>,
) -> Result<SecretKey> {
    let revocation_basepoint = PublicKey::from_secret_key(secp_ctx, revocation_basepoint_secret);
    let per_commitment_point = PublicKey::from_secret_key(secp_ctx, per_commitment_secret);

    let basepoint_tweak = tweak_from_points(&revocation_basepoint, &per_commitment_point)?;
    let point_tweak = tweak_from_points(&per_commitment_point, &revocation_basepoint)?;

    let basepoint_component = revocation_basepoint_secret
        .mul_tweak(&basepoint_tweak)
        .map_err(|_| Error::InvalidPoint)?;
    let point_component = per_commitment_secret
        .mul_tweak(&point_tweak)
        .map_err(|_| Error::InvalidPoint)?;

    let point_scalar =
        Scalar::from_be_bytes(point_component.secret_bytes()).map_err(|_| Error::InvalidPoint)?;
    basepoint_component
        .add_tweak(&point_scalar)
        .map_err(|_| Error::InvalidPoint)
}

// ============================================================================
// KEY SET
// ============================================================================

impl KeySet {
    /// Derive every key of one commitment view from both parties' basepoints.
    ///
    /// `holder` is the party whose commitment transaction is being built. The
    /// revocation key comes from the counterparty's revocation basepoint, so
    /// only the counterparty can sweep once the holder reveals this
    /// commitment's secret. The payment keys are the payment basepoints
    /// themselves, so the to_remote output stays spendable without knowing
    /// the per-commitment point.
    pub fn derive(
        per_commitment_point: &PublicKey,
        holder: &ChannelBasepoints,
        counterparty: &ChannelBasepoints,
        secp_ctx: &Secp256k1<All>,
    ) -> Result<KeySet> {
        let keys = KeySet {
            self_revocation_key: derive_revocation_public_key(
                &counterparty.revocation_basepoint,
                per_commitment_point,
                secp_ctx,
            )?,
            self_delayed_payment_key: derive_public_key(
                &holder.delayed_payment_basepoint,
                per_commitment_point,
                secp_ctx,
            )?,
            // static remote key: payment keys are never tweaked
            self_payment_key: holder.payment_basepoint,
            other_payment_key: counterparty.payment_basepoint,
            self_htlc_key: derive_public_key(
                &holder.htlc_basepoint,
                per_commitment_point,
                secp_ctx,
            )?,
            other_htlc_key: derive_public_key(
                &counterparty.htlc_basepoint,
                per_commitment_point,
                secp_ctx,
            )?,
        };

        trace!(
            per_commitment_point = %per_commitment_point,
            revocation_key = %keys.self_revocation_key,
            delayed_payment_key = %keys.self_delayed_payment_key,
            remote_payment_key = %keys.other_payment_key,
            local_htlc_key = %keys.self_htlc_key,
            remote_htlc_key = %keys.other_htlc_key,
            "derived commitment key set"
        );

        Ok(keys)
    }
}
