use bitcoin::blockdata::opcodes::all as opcodes;
use bitcoin::script::{Builder, ScriptBuf};
use bitcoin::secp256k1::PublicKey;
use bitcoin::Witness;

/// 2-of-2 funding redeem script: `2 <first> <second> 2 OP_CHECKMULTISIG`.
///
/// Keys are embedded in the order agreed when the channel was funded
/// (lexicographic for BOLT #3 channels); this function does not re-sort them.
pub fn create_funding_script(first_pubkey: &PublicKey, second_pubkey: &PublicKey) -> ScriptBuf {
    Builder::new()
        .push_int(2)
        .push_slice(first_pubkey.serialize())
        .push_slice(second_pubkey.serialize())
        .push_int(2)
        .push_opcode(opcodes::OP_CHECKMULTISIG)
        .into_script()
}

/// Witness spending the funding output. Signatures follow the key order of
/// `funding_script`.
pub fn create_funding_witness(
    first_signature: &[u8],
    second_signature: &[u8],
    funding_script: &ScriptBuf,
) -> Witness {
    Witness::from_slice(&[
        &[][..], // OP_0 for CHECKMULTISIG bug
        first_signature,
        second_signature,
        funding_script.as_bytes(),
    ])
}
