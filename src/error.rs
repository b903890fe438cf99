use thiserror::Error;

/// Errors returned while deriving keys or building commitment and HTLC transactions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A derived key landed on the point at infinity, or a hash was not a valid scalar
    #[error("derived key is not a valid curve point")]
    InvalidPoint,

    /// Satoshi, millisatoshi or weight arithmetic overflowed
    #[error("arithmetic overflow while computing {0}")]
    ArithmeticOverflow(&'static str),

    /// Local and remote builds of the same state produced different bytes
    #[error("local and remote views of the commitment diverge at byte {offset}")]
    MismatchedPerspective { offset: usize },

    /// Balances plus in-flight HTLCs exceed the funding output
    #[error("channel state totals {total_msat} msat but funding is only {funding_msat} msat")]
    ExceedsFunding { total_msat: u64, funding_msat: u64 },

    /// Commitment numbers are 48-bit values
    #[error("commitment number {0} does not fit in 48 bits")]
    CommitmentNumberOutOfRange(u64),

    #[error("commitment output {0} does not carry an HTLC")]
    NotAnHtlcOutput(usize),

    #[error("transaction has no input at index {0}")]
    InputIndex(usize),

    #[error("signature is not valid DER with a trailing sighash byte")]
    InvalidSignature,
}

pub type Result<T> = std::result::Result<T, Error>;
