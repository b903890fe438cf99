use bitcoin::hashes::Hash;
use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Amount, Transaction};

use crate::error::{Error, Result};

fn p2wsh_sighash(
    tx: &Transaction,
    input_index: usize,
    script: &ScriptBuf,
    amount_sat: u64,
) -> Result<Message> {
    let mut sighash_cache = SighashCache::new(tx);
    let sighash = sighash_cache
        .p2wsh_signature_hash(
            input_index,
            script,
            Amount::from_sat(amount_sat),
            EcdsaSighashType::All,
        )
        .map_err(|_| Error::InputIndex(input_index))?;

    Ok(Message::from_digest(sighash.to_byte_array()))
}

/// SIGHASH_ALL signature over a P2WSH input, DER encoded with the sighash
/// flag appended, ready for a witness stack.
pub fn sign_transaction_input(
    tx: &Transaction,
    input_index: usize,
    script: &ScriptBuf,
    amount_sat: u64,
    secret_key: &SecretKey,
    secp_ctx: &Secp256k1<All>,
) -> Result<Vec<u8>> {
    let msg = p2wsh_sighash(tx, input_index, script, amount_sat)?;
    let sig = secp_ctx.sign_ecdsa(&msg, secret_key);

    let mut sig_bytes = sig.serialize_der().to_vec();
    sig_bytes.push(EcdsaSighashType::All as u8);
    Ok(sig_bytes)
}

/// Check a witness-style signature (DER plus SIGHASH_ALL byte) against `pubkey`.
pub fn verify_signature(
    tx: &Transaction,
    input_index: usize,
    script: &ScriptBuf,
    amount_sat: u64,
    signature: &[u8],
    pubkey: &PublicKey,
    secp_ctx: &Secp256k1<All>,
) -> Result<bool> {
    let (sighash_flag, der) = signature.split_last().ok_or(Error::InvalidSignature)?;
    if *sighash_flag != EcdsaSighashType::All as u8 {
        return Err(Error::InvalidSignature);
    }
    let sig = Signature::from_der(der).map_err(|_| Error::InvalidSignature)?;
    let msg = p2wsh_sighash(tx, input_index, script, amount_sat)?;

    Ok(secp_ctx.verify_ecdsa(&msg, &sig, pubkey).is_ok())
}
