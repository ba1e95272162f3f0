//! Repository traits for valuation snapshots.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::valuation_model::PortfolioLog;
use crate::errors::Result;

/// Repository trait for managing portfolio value snapshots.
#[async_trait]
pub trait PortfolioLogRepositoryTrait: Send + Sync {
    async fn insert_log(&self, log: PortfolioLog) -> Result<PortfolioLog>;

    async fn update_log_value(&self, log_id: &str, total_value: Decimal) -> Result<PortfolioLog>;

    /// Returns the number of deleted rows.
    async fn delete_logs(&self, log_ids: Vec<String>) -> Result<usize>;

    /// Snapshot with the greatest valuation date, if any.
    fn get_latest_log(&self, portfolio_id: &str) -> Result<Option<PortfolioLog>>;

    /// Snapshots ordered by valuation date ascending.
    fn get_logs(&self, portfolio_id: &str) -> Result<Vec<PortfolioLog>>;
}
