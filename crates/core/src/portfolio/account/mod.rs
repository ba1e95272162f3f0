//! Portfolio account: cash plus lots, traded through a single service.

mod account_model;
mod account_service;
mod account_traits;

pub use account_model::{Portfolio, SaleReceipt, TradeCommit};
pub use account_service::PortfolioAccount;
pub use account_traits::{PortfolioAccountTrait, PortfolioRepositoryTrait};
