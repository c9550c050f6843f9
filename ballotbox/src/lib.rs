//! Encrypted ballot casting with a master-phrase eligibility check, per-center signed
//! tallies, and verification of the published results.

#[macro_use]
extern crate serde;

mod crypto;
mod eligibility;
mod error;
mod serde_hex;
mod store;
mod tally;
mod verification;
mod vote;

pub use crypto::*;
pub use eligibility::*;
pub use error::*;
pub use serde_hex::*;
pub use store::*;
pub use tally::*;
pub use verification::*;
pub use vote::*;

#[cfg(test)]
mod fixtures;
