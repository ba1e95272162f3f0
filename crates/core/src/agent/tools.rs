use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::errors::Result;
use crate::portfolio::{Lot, PortfolioAccountTrait};
use crate::sessions::SessionRepositoryTrait;

/// Plain-text answer handed back to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub success: bool,
    pub message: String,
}

impl ToolResponse {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

/// Binds the account to one session so an agent can trade with nothing but
/// a ticker and a share count. Trades execute at the session's simulated
/// date, read fresh on every call.
pub struct TradingToolkit {
    account: Arc<dyn PortfolioAccountTrait>,
    sessions: Arc<dyn SessionRepositoryTrait>,
    session_id: String,
}

impl TradingToolkit {
    pub fn new(
        account: Arc<dyn PortfolioAccountTrait>,
        sessions: Arc<dyn SessionRepositoryTrait>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            account,
            sessions,
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn buy(&self, ticker: &str, shares: Decimal, rationale: Option<&str>) -> ToolResponse {
        let result: Result<_> = async {
            let session = self.sessions.get_by_id(&self.session_id)?;
            self.account
                .buy(&session.id, ticker, shares, session.simulated_date, rationale)
                .await
        }
        .await;
        match result {
            Ok(trade) => ToolResponse::ok(format!(
                "Successfully bought {} shares of {}.",
                trade.shares, trade.symbol
            )),
            Err(e) => ToolResponse::failed(format!("Buy failed: {}", e)),
        }
    }

    pub async fn sell(
        &self,
        ticker: &str,
        shares: Decimal,
        rationale: Option<&str>,
    ) -> ToolResponse {
        let result: Result<_> = async {
            let session = self.sessions.get_by_id(&self.session_id)?;
            self.account
                .sell(
                    &session.id,
                    ticker,
                    shares,
                    session.simulated_date,
                    rationale,
                    false,
                )
                .await
        }
        .await;
        match result {
            Ok(receipt) => ToolResponse::ok(format!(
                "Successfully sold {} shares of {} for ${:.2}.",
                receipt.trade.shares,
                receipt.trade.symbol,
                receipt.proceeds.round_dp(DISPLAY_DECIMAL_PRECISION)
            )),
            Err(e) => ToolResponse::failed(format!("Sell failed: {}", e)),
        }
    }

    /// Holdings as `TICKER: shares` lines.
    pub fn get_portfolio(&self) -> ToolResponse {
        match self.account.get_holdings(&self.session_id) {
            Ok(holdings) if holdings.is_empty() => ToolResponse::ok("No holdings.".to_string()),
            Ok(holdings) => ToolResponse::ok(
                holdings
                    .iter()
                    .map(|(ticker, shares)| format!("{}: {}", ticker, shares.normalize()))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Err(e) => ToolResponse::failed(format!("Could not load portfolio: {}", e)),
        }
    }

    pub async fn get_total_value(&self) -> ToolResponse {
        let result: Result<Decimal> = async {
            let session = self.sessions.get_by_id(&self.session_id)?;
            self.account
                .get_total_value(&session.id, session.simulated_date)
                .await
        }
        .await;
        match result {
            Ok(value) => ToolResponse::ok(format!(
                "Total portfolio value: ${:.2}",
                value.round_dp(DISPLAY_DECIMAL_PRECISION)
            )),
            Err(e) => ToolResponse::failed(format!("Could not value portfolio: {}", e)),
        }
    }

    /// Open lots rendered for an advice prompt.
    pub fn describe_holdings(&self) -> Result<String> {
        Ok(describe_holdings(&self.account.get_open_lots(&self.session_id)?))
    }
}

/// One `"{shares} shares of {ticker} bought at ${price}"` line per lot.
pub fn describe_holdings(lots: &[Lot]) -> String {
    lots.iter()
        .map(|lot| {
            format!(
                "{} shares of {} bought at ${:.2}",
                lot.shares.normalize(),
                lot.ticker,
                lot.purchase_price.round_dp(DISPLAY_DECIMAL_PRECISION)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, day, seeded_session, InMemoryStore};
    use rust_decimal_macros::dec;

    async fn toolkit(store: &Arc<InMemoryStore>) -> TradingToolkit {
        let session = seeded_session(store, dec!(1000)).await;
        TradingToolkit::new(Arc::new(account(store)), store.clone(), session.id)
    }

    #[tokio::test]
    async fn test_buy_and_sell_messages() {
        let store = Arc::new(InMemoryStore::new());
        let tools = toolkit(&store).await;

        let bought = tools.buy("AAPL", dec!(5), Some("cheap")).await;
        assert!(bought.success);
        assert_eq!(bought.message, "Successfully bought 5 shares of AAPL.");

        let sold = tools.sell("AAPL", dec!(2), None).await;
        assert!(sold.success);
        assert_eq!(sold.message, "Successfully sold 2 shares of AAPL for $20.00.");

        assert_eq!(tools.get_portfolio().message, "AAPL: 3");
        assert_eq!(
            tools.get_total_value().await.message,
            "Total portfolio value: $1000.00"
        );
    }

    #[tokio::test]
    async fn test_failures_are_reported_as_text() {
        let store = Arc::new(InMemoryStore::new());
        let tools = toolkit(&store).await;

        let response = tools.buy("MSFT", dec!(10), None).await;
        assert!(!response.success);
        assert!(response.message.starts_with("Buy failed: Insufficient funds"));

        let response = tools.sell("AAPL", dec!(1), None).await;
        assert!(!response.success);
        assert!(response.message.starts_with("Sell failed: Not enough shares"));

        assert_eq!(tools.get_portfolio().message, "No holdings.");
    }

    #[tokio::test]
    async fn test_describe_holdings_lists_each_lot() {
        let store = Arc::new(InMemoryStore::new());
        let tools = toolkit(&store).await;
        let account = account(&store);
        account
            .buy(tools.session_id(), "AAPL", dec!(5), day(14), None)
            .await
            .unwrap();
        account
            .buy(tools.session_id(), "MSFT", dec!(1.5), day(15), None)
            .await
            .unwrap();

        assert_eq!(
            tools.describe_holdings().unwrap(),
            "5 shares of AAPL bought at $10.00\n1.5 shares of MSFT bought at $410.00"
        );
    }
}
