//! Bulk buy-order import from CSV.

mod order_import;

pub use order_import::{import_buy_orders, parse_buy_orders, BuyOrder, ImportFailure, ImportReport};
