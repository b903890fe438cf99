use bitcoin::blockdata::opcodes::all as opcodes;
use bitcoin::hashes::hash160::Hash as Hash160;
use bitcoin::hashes::ripemd160::Hash as Ripemd160;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, ScriptBuf};
use bitcoin::secp256k1::PublicKey;

/// Offered HTLC witness script, from the point of view of the commitment holder
/// who offered the HTLC.
///
/// Spend paths: the revocation key at any time, the receiver with the payment
/// preimage, or both HTLC keys through the HTLC-timeout transaction.
pub fn create_offered_htlc_script(
    revocation_pubkey: &PublicKey,
    local_htlcpubkey: &PublicKey,
    remote_htlcpubkey: &PublicKey,
    payment_hash: &[u8; 32],
) -> ScriptBuf {
    let payment_hash160 = Ripemd160::hash(payment_hash);
    let revocation_pubkey_hash = Hash160::hash(&revocation_pubkey.serialize());

    // OP_DUP OP_HASH160 <RIPEMD160(SHA256(revocationpubkey))> OP_EQUAL
    // OP_IF
    //     OP_CHECKSIG
    // OP_ELSE
    //     <remote_htlcpubkey> OP_SWAP OP_SIZE 32 OP_EQUAL
    //     OP_NOTIF
    //         OP_DROP 2 OP_SWAP <local_htlcpubkey> 2 OP_CHECKMULTISIG
    //     OP_ELSE
    //         OP_HASH160 <RIPEMD160(payment_hash)> OP_EQUALVERIFY
    //         OP_CHECKSIG
    //     OP_ENDIF
    // OP_ENDIF
    Builder::new()
        .push_opcode(opcodes::OP_DUP)
        .push_opcode(opcodes::OP_HASH160)
        .push_slice(revocation_pubkey_hash.to_byte_array())
        .push_opcode(opcodes::OP_EQUAL)
        .push_opcode(opcodes::OP_IF)
        .push_opcode(opcodes::OP_CHECKSIG)
        .push_opcode(opcodes::OP_ELSE)
        .push_slice(remote_htlcpubkey.serialize())
        .push_opcode(opcodes::OP_SWAP)
        .push_opcode(opcodes::OP_SIZE)
        .push_int(32)
        .push_opcode(opcodes::OP_EQUAL)
        .push_opcode(opcodes::OP_NOTIF)
        .push_opcode(opcodes::OP_DROP)
        .push_int(2)
        .push_opcode(opcodes::OP_SWAP)
        .push_slice(local_htlcpubkey.serialize())
        .push_int(2)
        .push_opcode(opcodes::OP_CHECKMULTISIG)
        .push_opcode(opcodes::OP_ELSE)
        .push_opcode(opcodes::OP_HASH160)
        .push_slice(payment_hash160.to_byte_array())
        .push_opcode(opcodes::OP_EQUALVERIFY)
        .push_opcode(opcodes::OP_CHECKSIG)
        .push_opcode(opcodes::OP_ENDIF)
        .push_opcode(opcodes::OP_ENDIF)
        .into_script()
}

/// Received HTLC witness script: the mirror of the offered script.
///
/// The holder claims with the preimage through the HTLC-success transaction,
/// the offerer reclaims after `cltv_expiry`, and the revocation key can always sweep.
pub fn create_received_htlc_script(
    revocation_pubkey: &PublicKey,
    local_htlcpubkey: &PublicKey,
    remote_htlcpubkey: &PublicKey,
    payment_hash: &[u8; 32],
    cltv_expiry: u32,
) -> ScriptBuf {
    let payment_hash160 = Ripemd160::hash(payment_hash);
    let revocation_pubkey_hash = Hash160::hash(&revocation_pubkey.serialize());

    // OP_DUP OP_HASH160 <RIPEMD160(SHA256(revocationpubkey))> OP_EQUAL
    // OP_IF
    //     OP_CHECKSIG
    // OP_ELSE
    //     <remote_htlcpubkey> OP_SWAP OP_SIZE 32 OP_EQUAL
    //     OP_IF
    //         OP_HASH160 <RIPEMD160(payment_hash)> OP_EQUALVERIFY
    //         2 OP_SWAP <local_htlcpubkey> 2 OP_CHECKMULTISIG
    //     OP_ELSE
    //         OP_DROP <cltv_expiry> OP_CHECKLOCKTIMEVERIFY OP_DROP
    //         OP_CHECKSIG
    //     OP_ENDIF
    // OP_ENDIF
    Builder::new()
        .push_opcode(opcodes::OP_DUP)
        .push_opcode(opcodes::OP_HASH160)
        .push_slice(revocation_pubkey_hash.to_byte_array())
        .push_opcode(opcodes::OP_EQUAL)
        .push_opcode(opcodes::OP_IF)
        .push_opcode(opcodes::OP_CHECKSIG)
        .push_opcode(opcodes::OP_ELSE)
        .push_slice(remote_htlcpubkey.serialize())
        .push_opcode(opcodes::OP_SWAP)
        .push_opcode(opcodes::OP_SIZE)
        .push_int(32)
        .push_opcode(opcodes::OP_EQUAL)
        .push_opcode(opcodes::OP_IF)
        .push_opcode(opcodes::OP_HASH160)
        .push_slice(payment_hash160.to_byte_array())
        .push_opcode(opcodes::OP_EQUALVERIFY)
        .push_int(2)
        .push_opcode(opcodes::OP_SWAP)
        .push_slice(local_htlcpubkey.serialize())
        .push_int(2)
        .push_opcode(opcodes::OP_CHECKMULTISIG)
        .push_opcode(opcodes::OP_ELSE)
        .push_opcode(opcodes::OP_DROP)
        .push_int(cltv_expiry as i64)
        .push_opcode(opcodes::OP_CLTV)
        .push_opcode(opcodes::OP_DROP)
        .push_opcode(opcodes::OP_CHECKSIG)
        .push_opcode(opcodes::OP_ENDIF)
        .push_opcode(opcodes::OP_ENDIF)
        .into_script()
}
