use bitcoin::secp256k1::{PublicKey, Secp256k1};

use super::fixtures::*;
use crate::*;

// BOLT #3 Appendix E
const BASE_SECRET: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
const BASE_POINT: &str = "036d6caac248af96f6afa7f904f550253a0f3ef3f5aa2fe6838a95b216691468e2";

#[test]
fn test_derivation_of_local_public_key() {
    let secp = Secp256k1::new();

    let base_point = pubkey(BASE_POINT);
    let per_commitment_point = pubkey(PER_COMMITMENT_POINT);
    let expected_localpubkey =
        pubkey("0235f2dbfaa89b57ec7b055afe29849ef7ddfeb1cefdb9ebdc43f5494984db29e5");

    let actual_local_pubkey =
        derive_public_key(&base_point, &per_commitment_point, &secp).unwrap();

    assert_eq!(
        actual_local_pubkey, expected_localpubkey,
        "Local public keys do not match"
    );
}

#[test]
fn test_derivation_of_local_private_key() {
    let secp = Secp256k1::new();

    let basepoint_secret = secret(BASE_SECRET);
    let per_commitment_point = pubkey(PER_COMMITMENT_POINT);
    let expected_localprivkey =
        secret("cbced912d3b21bf196a766651e436aff192362621ce317704ea2f75d87e7be0f");

    let actual_local_privkey =
        derive_private_key(&basepoint_secret, &per_commitment_point, &secp).unwrap();

    assert_eq!(
        expected_localprivkey, actual_local_privkey,
        "Local private keys do not match"
    );
    assert_eq!(
        PublicKey::from_secret_key(&secp, &actual_local_privkey),
        derive_public_key(&pubkey(BASE_POINT), &per_commitment_point, &secp).unwrap()
    );
}

#[test]
fn test_derivation_of_revocation_pubkey() {
    let secp = Secp256k1::new();

    let revocation_basepoint = pubkey(BASE_POINT);
    let per_commitment_point = pubkey(PER_COMMITMENT_POINT);
    let expected_revocation_pubkey =
        pubkey("02916e326636d19c33f13e8c0c3a03dd157f332f3e99c317c141dd865eb01f8ff0");

    let actual_revocation_pubkey =
        derive_revocation_public_key(&revocation_basepoint, &per_commitment_point, &secp)
            .unwrap();

    assert_eq!(
        expected_revocation_pubkey, actual_revocation_pubkey,
        "Revocation public keys do not match"
    );
}

#[test]
fn test_derivation_of_revocation_privkey() {
    let secp = Secp256k1::new();

    let revocation_basepoint_secret = secret(BASE_SECRET);
    let per_commitment_secret = secret(PER_COMMITMENT_SECRET);
    let expected_revocation_privkey =
        secret("d09ffff62ddb2297ab000cc85bcb4283fdeb6aa052affbc9dddcf33b61078110");

    let actual_revocation_privkey =
        derive_revocation_private_key(&revocation_basepoint_secret, &per_commitment_secret, &secp)
            .unwrap();

    assert_eq!(
        expected_revocation_privkey, actual_revocation_privkey,
        "Revocation private keys do not match"
    );
    assert_eq!(
        PublicKey::from_secret_key(&secp, &actual_revocation_privkey),
        pubkey("02916e326636d19c33f13e8c0c3a03dd157f332f3e99c317c141dd865eb01f8ff0")
    );
}

#[test]
fn test_per_commitment_point_from_secret() {
    let secp = Secp256k1::new();
    assert_eq!(
        PublicKey::from_secret_key(&secp, &secret(PER_COMMITMENT_SECRET)),
        pubkey(PER_COMMITMENT_POINT)
    );
}

#[test]
fn test_key_set_from_basepoints() {
    let secp = Secp256k1::new();

    let keys = KeySet::derive(
        &pubkey(PER_COMMITMENT_POINT),
        &local_basepoints(),
        &remote_basepoints(),
        &secp,
    )
    .unwrap();

    assert_eq!(keys, local_keys());
    assert_eq!(local_basepoints().payment_basepoint, pubkey(LOCAL_PAYMENT_BASEPOINT));
    assert_eq!(remote_basepoints().payment_basepoint, pubkey(REMOTE_PAYMENT_BASEPOINT));

    // to_remote pays the basepoint, HTLC keys are still tweaked
    assert_eq!(keys.other_payment_key, pubkey(REMOTE_PAYMENT_BASEPOINT));
    assert_ne!(keys.other_payment_key, pubkey(REMOTE_PAYMENT_KEY));
    assert_eq!(keys.other_htlc_key, pubkey(REMOTE_PAYMENT_KEY));
}

#[test]
fn test_to_remote_pays_payment_basepoint() {
    let secp = Secp256k1::new();
    let keys = KeySet::derive(
        &pubkey(PER_COMMITMENT_POINT),
        &local_basepoints(),
        &remote_basepoints(),
        &secp,
    )
    .unwrap();

    let outputs = create_commitment_transaction_outputs(
        6_989_140,
        3_000_000,
        &keys,
        TO_SELF_DELAY,
        DUST_LIMIT_SAT,
    );
    let to_remote = outputs.iter().find(|output| output.value == 3_000_000).unwrap();
    assert_eq!(
        hex::encode(to_remote.script.as_bytes()),
        "0014cc1b07838e387deacd0e5232e1e8b49f4c29e484"
    );
}

#[test]
fn test_htlc_private_keys_match_vector() {
    let secp = Secp256k1::new();
    let per_commitment_point = pubkey(PER_COMMITMENT_POINT);

    let local_htlc_privkey = derive_private_key(
        &secret(LOCAL_PAYMENT_BASEPOINT_SECRET),
        &per_commitment_point,
        &secp,
    )
    .unwrap();
    let remote_htlc_privkey = derive_private_key(
        &secret(REMOTE_PAYMENT_BASEPOINT_SECRET),
        &per_commitment_point,
        &secp,
    )
    .unwrap();
    let local_delayed_privkey = derive_private_key(
        &secret(LOCAL_DELAYED_PAYMENT_BASEPOINT_SECRET),
        &per_commitment_point,
        &secp,
    )
    .unwrap();

    assert_eq!(local_htlc_privkey, secret(LOCAL_HTLC_PRIVKEY));
    assert_eq!(remote_htlc_privkey, secret(REMOTE_HTLC_PRIVKEY));
    assert_eq!(
        local_delayed_privkey,
        secret("adf3464ce9c2f230fd2582fda4c6965e4993ca5524e8c9580e3df0cf226981ad")
    );
}

// ============================================================================
// PER-COMMITMENT SECRET GENERATION (BOLT #3 Appendix D)
// ============================================================================

#[test]
fn test_generate_from_seed() {
    let cases: [([u8; 32], u64, &str); 5] = [
        (
            [0x00; 32],
            281474976710655,
            "02a40c85b6f28da08dfdbe0926c53fab2de6d28c10301f8f7c4073d5e42e3148",
        ),
        (
            [0xff; 32],
            281474976710655,
            "7cc854b54e3e0dcdb010d7a3fee464a9687be6e8db3be6854c475621e007a5dc",
        ),
        (
            [0xff; 32],
            0xaaaaaaaaaaa,
            "56f4008fb007ca9acf0e15b054d5c9fd12ee06cea347914ddbaed70d1c13a528",
        ),
        (
            [0xff; 32],
            0x555555555555,
            "9015daaeb06dba4ccc05b91b2f73bd54405f2be9f217fbacd3c5ac2e62327d31",
        ),
        (
            [0x01; 32],
            1,
            "915c75942a26bb3a433a8ce2cb0427c29ec6c1775cfc78328b57f6ba7bfeaa9c",
        ),
    ];

    for (seed, index, expected) in cases {
        assert_eq!(
            hex::encode(build_commitment_secret(&seed, index)),
            expected,
            "index {:#x}",
            index
        );
    }
}

#[test]
fn test_per_commitment_secret_counts_down() {
    let seed = [0xff; 32];

    assert_eq!(
        per_commitment_secret(&seed, 0).unwrap(),
        build_commitment_secret(&seed, INITIAL_COMMITMENT_NUMBER)
    );
    assert_eq!(
        per_commitment_secret(&seed, 42).unwrap(),
        build_commitment_secret(&seed, INITIAL_COMMITMENT_NUMBER - 42)
    );
    assert_eq!(
        per_commitment_secret(&seed, INITIAL_COMMITMENT_NUMBER + 1),
        Err(Error::CommitmentNumberOutOfRange(INITIAL_COMMITMENT_NUMBER + 1))
    );
}

#[test]
fn test_channel_secrets() {
    let secp = Secp256k1::new();
    let secrets = ChannelSecrets {
        funding_key: secret(LOCAL_FUNDING_PRIVKEY),
        revocation_basepoint_secret: secret(LOCAL_REVOCATION_BASEPOINT_SECRET),
        payment_basepoint_secret: secret(LOCAL_PAYMENT_BASEPOINT_SECRET),
        delayed_payment_basepoint_secret: secret(LOCAL_DELAYED_PAYMENT_BASEPOINT_SECRET),
        htlc_basepoint_secret: secret(LOCAL_PAYMENT_BASEPOINT_SECRET),
        commitment_seed: [0xff; 32],
    };

    assert_eq!(secrets.funding_pubkey(&secp), pubkey(LOCAL_FUNDING_PUBKEY));
    assert_eq!(secrets.basepoints(&secp), local_basepoints());

    let point = secrets.per_commitment_point(42, &secp).unwrap();
    let secret_key = secrets.per_commitment_secret(42).unwrap();
    assert_eq!(point, PublicKey::from_secret_key(&secp, &secret_key));
    assert_eq!(
        secret_key.secret_bytes(),
        per_commitment_secret(&[0xff; 32], 42).unwrap()
    );
}
