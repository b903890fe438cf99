pub mod funding;
pub mod commitment;
pub mod htlc;

pub use funding::*;
pub use commitment::*;
pub use htlc::*;
