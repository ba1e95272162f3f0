//! Portfolio ledger: lots, the account that trades them, the trade journal
//! and valuation snapshots.

pub mod account;
pub mod journal;
pub mod lots;
pub mod valuation;

pub use account::*;
pub use journal::*;
pub use lots::*;
pub use valuation::*;
