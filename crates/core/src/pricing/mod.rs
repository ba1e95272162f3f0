//! Price resolution for the ledger.
//!
//! The account never talks to a market-data provider directly: it is handed a
//! [`PriceSourceTrait`] object, either a provider wrapped in
//! [`CachedPriceSource`] or a fixed [`PriceTable`] for deterministic replays.

mod cached_price_source;
mod price_table;
mod pricing_traits;

pub use cached_price_source::CachedPriceSource;
pub use price_table::PriceTable;
pub use pricing_traits::PriceSourceTrait;
