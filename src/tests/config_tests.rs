use bitcoin::secp256k1::Secp256k1;

use super::fixtures::*;
use crate::config::{ChannelStateFile, ConfigError};
use crate::*;

const DEMO_STATE: &str = include_str!("../../demos/bolt3_commitment.json");

#[test]
fn test_demo_state_builds_vector_commitment() {
    let secp = Secp256k1::new();
    let state = ChannelStateFile::from_json(DEMO_STATE)
        .unwrap()
        .to_channel_state()
        .unwrap();

    assert_eq!(state.params, channel_parameters());
    assert_eq!(state.holder, local_basepoints());
    assert_eq!(state.counterparty, remote_basepoints());
    assert_eq!(state.htlcs, vector_htlcs());

    let (keys, commitment) = build_commitment_from_basepoints(
        &state.params,
        &state.per_commitment_point,
        &state.holder,
        &state.counterparty,
        state.feerate_per_kw,
        state.to_self_msat,
        state.to_other_msat,
        &state.htlcs,
        state.counterparty_htlcs.as_deref(),
        state.commitment_number,
        state.perspective,
        &secp,
    )
    .unwrap();

    assert_eq!(keys, local_keys());
    assert_eq!(commitment, build_htlc_vector(0));
}

#[test]
fn test_remote_perspective_orders_payment_basepoints_by_opener() {
    let mut file = ChannelStateFile::from_json(DEMO_STATE).unwrap();
    file.perspective = Side::Remote;
    std::mem::swap(&mut file.holder, &mut file.counterparty);

    let state = file.to_channel_state().unwrap();
    assert_eq!(state.params.opener_payment_basepoint, pubkey(LOCAL_PAYMENT_BASEPOINT));
    assert_eq!(state.params.accepter_payment_basepoint, pubkey(REMOTE_PAYMENT_BASEPOINT));
}

#[test]
fn test_rejects_malformed_values() {
    let mut file = ChannelStateFile::from_json(DEMO_STATE).unwrap();
    file.per_commitment_point = "zz".to_string();
    assert!(matches!(file.to_channel_state(), Err(ConfigError::Hex(_))));

    let mut file = ChannelStateFile::from_json(DEMO_STATE).unwrap();
    file.htlcs[0].payment_hash = "0011".to_string();
    assert!(matches!(
        file.to_channel_state(),
        Err(ConfigError::Length {
            field: "payment_hash",
            expected: 32,
            actual: 2
        })
    ));

    let mut file = ChannelStateFile::from_json(DEMO_STATE).unwrap();
    file.holder.payment_basepoint = format!("05{}", "11".repeat(32));
    assert!(matches!(file.to_channel_state(), Err(ConfigError::Key(_))));

    let bad_side = DEMO_STATE.replacen("\"opener\": \"local\"", "\"opener\": \"both\"", 1);
    assert!(matches!(
        ChannelStateFile::from_json(&bad_side),
        Err(ConfigError::Json(_))
    ));

    assert!(matches!(
        ChannelStateFile::from_path("does/not/exist.json"),
        Err(ConfigError::Io(_))
    ));
}

fn build_from_file(file: &ChannelStateFile) -> crate::Result<CommitmentTransaction> {
    let secp = Secp256k1::new();
    let state = file.to_channel_state().unwrap();
    build_commitment_from_basepoints(
        &state.params,
        &state.per_commitment_point,
        &state.holder,
        &state.counterparty,
        state.feerate_per_kw,
        state.to_self_msat,
        state.to_other_msat,
        &state.htlcs,
        state.counterparty_htlcs.as_deref(),
        state.commitment_number,
        state.perspective,
        &secp,
    )
    .map(|(_, commitment)| commitment)
}

#[test]
fn test_counterparty_htlc_record_is_cross_checked() {
    let mut file = ChannelStateFile::from_json(DEMO_STATE).unwrap();
    let mut counterparty_htlcs = file.htlcs.clone();
    for htlc in counterparty_htlcs.iter_mut() {
        htlc.offerer = htlc.offerer.counterparty();
    }
    file.counterparty_htlcs = Some(counterparty_htlcs);
    assert_eq!(build_from_file(&file).unwrap(), build_htlc_vector(0));

    // the counterparty recorded HTLC #2 in the wrong direction
    if let Some(htlcs) = file.counterparty_htlcs.as_mut() {
        htlcs[2].offerer = htlcs[2].offerer.counterparty();
    }
    assert!(matches!(
        build_from_file(&file),
        Err(Error::MismatchedPerspective { .. })
    ));
}
