//! BOLT #3 commitment and HTLC transaction construction.

// Re-export commonly used external types
pub use bitcoin::secp256k1::{All, PublicKey, Secp256k1, SecretKey};

pub mod config;
pub mod error;
pub mod keys;
pub mod scripts;
pub mod signing;
pub mod transactions;
pub mod types;
pub mod workflows;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use keys::channel::*;
pub use keys::commitment::*;
pub use scripts::commitment::*;
pub use scripts::funding::*;
pub use scripts::htlc::*;
pub use signing::*;
pub use transactions::commitment::*;
pub use transactions::fees::*;
pub use transactions::htlc::*;
pub use types::*;
pub use workflows::*;

// Constants
pub const INITIAL_COMMITMENT_NUMBER: u64 = (1 << 48) - 1;
