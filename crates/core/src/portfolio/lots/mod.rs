//! Purchase lots and FIFO matching.

mod lot_ledger;
mod lots_model;

pub use lot_ledger::{aggregate_holdings, LotLedger, SalePlan};
pub use lots_model::{Lot, LotChange};
