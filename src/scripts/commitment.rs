use bitcoin::blockdata::opcodes::all as opcodes;
use bitcoin::hashes::hash160::Hash as Hash160;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, ScriptBuf};
use bitcoin::secp256k1::PublicKey;

/// to_remote output script (P2WPKH): `OP_0 <hash160(payment_key)>`
pub fn create_to_remote_script(payment_key: &PublicKey) -> ScriptBuf {
    let pubkey_hash = Hash160::hash(&payment_key.serialize());

    Builder::new()
        .push_int(0)
        .push_slice(pubkey_hash.to_byte_array())
        .into_script()
}

/// Revocable-delay witness script, used by the to_local output and by both
/// HTLC second-stage outputs.
pub fn create_to_local_script(
    revocation_pubkey: &PublicKey,
    delayed_payment_pubkey: &PublicKey,
    to_self_delay: u16,
) -> ScriptBuf {
    // OP_IF
    //     <revocationpubkey>
    // OP_ELSE
    //     <to_self_delay> OP_CHECKSEQUENCEVERIFY OP_DROP
    //     <local_delayedpubkey>
    // OP_ENDIF
    // OP_CHECKSIG
    Builder::new()
        .push_opcode(opcodes::OP_IF)
        .push_slice(revocation_pubkey.serialize())
        .push_opcode(opcodes::OP_ELSE)
        .push_int(to_self_delay as i64)
        .push_opcode(opcodes::OP_CSV)
        .push_opcode(opcodes::OP_DROP)
        .push_slice(delayed_payment_pubkey.serialize())
        .push_opcode(opcodes::OP_ENDIF)
        .push_opcode(opcodes::OP_CHECKSIG)
        .into_script()
}
