pub mod channel;
pub mod commitment;

pub use channel::{build_commitment_secret, per_commitment_secret, ChannelSecrets};
pub use commitment::{
    derive_private_key, derive_public_key, derive_revocation_private_key,
    derive_revocation_public_key,
};
