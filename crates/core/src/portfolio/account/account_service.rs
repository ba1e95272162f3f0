use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use rust_decimal::Decimal;

use super::account_model::{SaleReceipt, TradeCommit};
use super::account_traits::{PortfolioAccountTrait, PortfolioRepositoryTrait};
use crate::constants::DEFAULT_RATIONALE;
use crate::errors::{LedgerError, Result};
use crate::portfolio::journal::{replay_cash, TradeJournalRepositoryTrait, TradeLog};
use crate::portfolio::lots::{aggregate_holdings, Lot, LotChange, LotLedger};
use crate::portfolio::valuation::{calculate_valuation, PortfolioValuation};
use crate::pricing::PriceSourceTrait;
use crate::sessions::{SessionRepositoryTrait, SimulationSession};
use crate::tickers::{normalize_ticker, TickerRegistryTrait};

/// Executes trades against a session's portfolio.
///
/// Each operation validates against the current state, plans the complete
/// [`TradeCommit`] in memory and hands it to the repository. Nothing is
/// written before every check has passed.
pub struct PortfolioAccount {
    sessions: Arc<dyn SessionRepositoryTrait>,
    portfolios: Arc<dyn PortfolioRepositoryTrait>,
    journal: Arc<dyn TradeJournalRepositoryTrait>,
    registry: Arc<dyn TickerRegistryTrait>,
    price_source: Arc<dyn PriceSourceTrait>,
}

impl PortfolioAccount {
    pub fn new(
        sessions: Arc<dyn SessionRepositoryTrait>,
        portfolios: Arc<dyn PortfolioRepositoryTrait>,
        journal: Arc<dyn TradeJournalRepositoryTrait>,
        registry: Arc<dyn TickerRegistryTrait>,
        price_source: Arc<dyn PriceSourceTrait>,
    ) -> Self {
        Self {
            sessions,
            portfolios,
            journal,
            registry,
            price_source,
        }
    }

    fn ensure_tradable(&self, session: &SimulationSession, ticker: &str) -> Result<()> {
        if !self.registry.is_tradable(ticker)? || !session.allows(ticker) {
            return Err(LedgerError::InvalidTicker(ticker.to_string()).into());
        }
        Ok(())
    }

    fn replayed_cash(&self, session: &SimulationSession) -> Result<Decimal> {
        let entries = self.journal.list_by_session(&session.id)?;
        Ok(replay_cash(session.amount, &entries))
    }

    async fn commit(&self, commit: TradeCommit) -> Result<TradeLog> {
        let session_id = commit.session_id.clone();
        self.portfolios.commit_trade(commit).await.map_err(|e| {
            error!("Trade commit failed for session {}: {}", session_id, e);
            e
        })
    }
}

fn rationale_or_default(rationale: Option<&str>) -> &str {
    rationale
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_RATIONALE)
}

#[async_trait]
impl PortfolioAccountTrait for PortfolioAccount {
    async fn buy(
        &self,
        session_id: &str,
        ticker: &str,
        shares: Decimal,
        as_of: NaiveDate,
        rationale: Option<&str>,
    ) -> Result<TradeLog> {
        if shares <= Decimal::ZERO {
            return Err(LedgerError::InvalidQuantity(shares).into());
        }
        let session = self.sessions.get_by_id(session_id)?;
        let ticker = normalize_ticker(ticker);
        self.ensure_tradable(&session, &ticker)?;

        let price = self.price_source.get_price(&ticker, as_of).await?;

        let portfolio = self.portfolios.get_by_session(session_id)?;
        let available = self.replayed_cash(&session)?;
        // An order too large to price cannot be funded either.
        let required = shares.checked_mul(price).unwrap_or(Decimal::MAX);
        if available < required {
            return Err(LedgerError::InsufficientFunds {
                available,
                price,
                shares,
                required,
            }
            .into());
        }

        let lot = Lot::new(&portfolio.id, session_id, &ticker, shares, price, as_of);
        let trade = TradeLog::buy(
            session_id,
            &ticker,
            shares,
            price,
            rationale_or_default(rationale),
            as_of,
        );
        let trade = self
            .commit(TradeCommit {
                portfolio_id: portfolio.id,
                session_id: session_id.to_string(),
                cash_after: available - required,
                lot_changes: vec![LotChange::Open(lot)],
                trade,
            })
            .await?;

        info!(
            "Session {} bought {} {} at {} on {}",
            session_id, shares, ticker, price, as_of
        );
        Ok(trade)
    }

    async fn sell(
        &self,
        session_id: &str,
        ticker: &str,
        shares: Decimal,
        as_of: NaiveDate,
        rationale: Option<&str>,
        force: bool,
    ) -> Result<SaleReceipt> {
        let session = self.sessions.get_by_id(session_id)?;
        let ticker = normalize_ticker(ticker);
        if !force {
            self.ensure_tradable(&session, &ticker)?;
        }
        if shares <= Decimal::ZERO {
            return Err(LedgerError::InvalidQuantity(shares).into());
        }

        let portfolio = self.portfolios.get_by_session(session_id)?;
        let ledger = LotLedger::new(
            &ticker,
            self.portfolios.get_open_lots(&portfolio.id, Some(&ticker))?,
        );
        let held = ledger.held_shares();
        if held < shares {
            return Err(LedgerError::InsufficientShares {
                ticker,
                requested: shares,
                held,
            }
            .into());
        }

        let (price, used_fallback_price) = match self.price_source.get_price(&ticker, as_of).await
        {
            Ok(price) => (price, false),
            Err(err) if force => match ledger.last_purchase_price() {
                Some(fallback) => {
                    warn!(
                        "Forced sale of {} on {}: {}. Using last purchase price {}",
                        ticker, as_of, err, fallback
                    );
                    (fallback, true)
                }
                None => return Err(err),
            },
            Err(err) => return Err(err),
        };

        let plan = ledger.plan_sale(shares, price)?;
        let available = self.replayed_cash(&session)?;
        let (proceeds, cash_after) = shares
            .checked_mul(price)
            .and_then(|proceeds| Some((proceeds, available.checked_add(proceeds)?)))
            .ok_or(LedgerError::InvalidQuantity(shares))?;
        let trade = TradeLog::sell(
            session_id,
            &ticker,
            shares,
            price,
            plan.realized_profit,
            rationale_or_default(rationale),
            as_of,
        );
        let trade = self
            .commit(TradeCommit {
                portfolio_id: portfolio.id,
                session_id: session_id.to_string(),
                cash_after,
                lot_changes: plan.changes,
                trade,
            })
            .await?;

        info!(
            "Session {} sold {} {} at {} on {} (profit {})",
            session_id, shares, ticker, price, as_of, plan.realized_profit
        );
        Ok(SaleReceipt {
            trade,
            proceeds,
            realized_profit: plan.realized_profit,
            used_fallback_price,
        })
    }

    fn get_cash(&self, session_id: &str) -> Result<Decimal> {
        let session = self.sessions.get_by_id(session_id)?;
        self.replayed_cash(&session)
    }

    fn get_holdings(&self, session_id: &str) -> Result<BTreeMap<String, Decimal>> {
        Ok(aggregate_holdings(&self.get_open_lots(session_id)?))
    }

    fn get_open_lots(&self, session_id: &str) -> Result<Vec<Lot>> {
        let portfolio = self.portfolios.get_by_session(session_id)?;
        self.portfolios.get_open_lots(&portfolio.id, None)
    }

    async fn get_total_value(&self, session_id: &str, as_of: NaiveDate) -> Result<Decimal> {
        Ok(self.get_valuation(session_id, as_of).await?.total_value)
    }

    async fn get_valuation(
        &self,
        session_id: &str,
        as_of: NaiveDate,
    ) -> Result<PortfolioValuation> {
        let session = self.sessions.get_by_id(session_id)?;
        let portfolio = self.portfolios.get_by_session(session_id)?;
        let lots = self.portfolios.get_open_lots(&portfolio.id, None)?;
        let cash = self.replayed_cash(&session)?;

        let mut prices: HashMap<String, Decimal> = HashMap::new();
        for lot in &lots {
            if prices.contains_key(&lot.ticker) {
                continue;
            }
            let price = self.price_source.get_price(&lot.ticker, as_of).await?;
            prices.insert(lot.ticker.clone(), price);
        }
        debug!(
            "Valuing session {} on {} with {} priced tickers",
            session_id,
            as_of,
            prices.len()
        );

        calculate_valuation(session_id, &portfolio.id, cash, &lots, &prices, as_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::pricing::PriceTable;
    use crate::test_support::{
        account, account_with, day, price_table, seeded_session, InMemoryStore,
    };
    use crate::tickers::{Stock, StaticTickerRegistry};
    use rust_decimal_macros::dec;

    fn ledger_err<T: std::fmt::Debug>(result: Result<T>) -> LedgerError {
        match result {
            Err(Error::Ledger(e)) => e,
            other => panic!("expected ledger error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_buy_debits_cash_and_opens_lot() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let account = account(&store);

        let trade = account
            .buy(&session.id, "aapl", dec!(5), day(14), Some("momentum"))
            .await
            .unwrap();

        assert_eq!(trade.symbol, "AAPL");
        assert_eq!(trade.total_price, dec!(50));
        assert_eq!(trade.profit, dec!(0));
        assert_eq!(trade.rationale, "momentum");
        assert_eq!(account.get_cash(&session.id).unwrap(), dec!(950));
        assert_eq!(
            store.get_by_session(&session.id).unwrap().cash,
            dec!(950)
        );
        let lots = account.get_open_lots(&session.id).unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].purchase_date, day(14));
        assert_eq!(lots[0].purchase_price, dec!(10));
    }

    #[tokio::test]
    async fn test_fifo_sale_realizes_profit_from_oldest_lots() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let account = account(&store);

        account.buy(&session.id, "AAPL", dec!(5), day(14), None).await.unwrap();
        account.buy(&session.id, "AAPL", dec!(5), day(15), None).await.unwrap();
        let receipt = account
            .sell(&session.id, "AAPL", dec!(7), day(18), None, false)
            .await
            .unwrap();

        assert_eq!(receipt.realized_profit, dec!(120));
        assert_eq!(receipt.proceeds, dec!(210));
        assert_eq!(receipt.trade.profit, dec!(120));
        assert_eq!(receipt.trade.rationale, DEFAULT_RATIONALE);
        assert!(!receipt.used_fallback_price);

        let lots = account.get_open_lots(&session.id).unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].shares, dec!(3));
        assert_eq!(lots[0].purchase_price, dec!(20));
        // 1000 - 50 - 100 + 210
        assert_eq!(account.get_cash(&session.id).unwrap(), dec!(1060));
    }

    #[tokio::test]
    async fn test_overspending_buy_changes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let account = account(&store);

        let err = ledger_err(account.buy(&session.id, "MSFT", dec!(3), day(14), None).await);
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                available: dec!(1000),
                price: dec!(400),
                shares: dec!(3),
                required: dec!(1200),
            }
        );
        assert_eq!(store.lot_count(), 0);
        assert_eq!(store.trade_count(), 0);
        assert_eq!(account.get_cash(&session.id).unwrap(), dec!(1000));
    }

    #[tokio::test]
    async fn test_unpriceably_large_buy_is_insufficient_funds() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let account = account(&store);

        let err = ledger_err(
            account
                .buy(&session.id, "MSFT", Decimal::MAX, day(14), None)
                .await,
        );
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(store.lot_count(), 0);
        assert_eq!(store.trade_count(), 0);
        assert_eq!(account.get_cash(&session.id).unwrap(), dec!(1000));
    }

    #[tokio::test]
    async fn test_oversell_changes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let account = account(&store);
        account.buy(&session.id, "AAPL", dec!(5), day(14), None).await.unwrap();

        let err = ledger_err(
            account
                .sell(&session.id, "AAPL", dec!(6), day(15), None, false)
                .await,
        );
        assert_eq!(
            err,
            LedgerError::InsufficientShares {
                ticker: "AAPL".to_string(),
                requested: dec!(6),
                held: dec!(5),
            }
        );
        assert_eq!(store.trade_count(), 1);
        assert_eq!(account.get_holdings(&session.id).unwrap()["AAPL"], dec!(5));
    }

    #[tokio::test]
    async fn test_non_positive_quantities_are_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let account = account(&store);

        for shares in [dec!(0), dec!(-1)] {
            assert_eq!(
                ledger_err(account.buy(&session.id, "AAPL", shares, day(14), None).await),
                LedgerError::InvalidQuantity(shares)
            );
            assert_eq!(
                ledger_err(
                    account
                        .sell(&session.id, "AAPL", shares, day(14), None, false)
                        .await
                ),
                LedgerError::InvalidQuantity(shares)
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_and_disallowed_tickers_are_invalid() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let account = account(&store);

        assert_eq!(
            ledger_err(account.buy(&session.id, "ZZZZ", dec!(1), day(14), None).await),
            LedgerError::InvalidTicker("ZZZZ".to_string())
        );

        let restricted = {
            let mut s = seeded_session(&store, dec!(1000)).await;
            s.tickers = vec!["MSFT".to_string()];
            SessionRepositoryTrait::delete(store.as_ref(), &s.id).await.unwrap();
            let portfolio = crate::portfolio::Portfolio::new(&s.id, s.amount);
            SessionRepositoryTrait::create(store.as_ref(), s, portfolio)
                .await
                .unwrap()
        };
        assert_eq!(
            ledger_err(account.buy(&restricted.id, "AAPL", dec!(1), day(14), None).await),
            LedgerError::InvalidTicker("AAPL".to_string())
        );
    }

    #[tokio::test]
    async fn test_weekend_buy_is_price_unavailable() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let account = account(&store);

        let err = ledger_err(account.buy(&session.id, "AAPL", dec!(1), day(16), None).await);
        assert!(matches!(err, LedgerError::PriceUnavailable { .. }));
        assert_eq!(store.trade_count(), 0);
    }

    #[tokio::test]
    async fn test_force_sell_of_delisted_ticker_uses_last_purchase_price() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;

        let listed = account_with(
            &store,
            StaticTickerRegistry::new(vec![Stock::new("LEH", "Lehman Brothers")]),
            PriceTable::new()
                .with_close("LEH", day(14), dec!(3))
                .with_close("LEH", day(15), dec!(4)),
        );
        listed.buy(&session.id, "LEH", dec!(10), day(14), None).await.unwrap();
        listed.buy(&session.id, "LEH", dec!(10), day(15), None).await.unwrap();

        let delisted = account(&store);
        assert_eq!(
            ledger_err(
                delisted
                    .sell(&session.id, "LEH", dec!(15), day(18), None, false)
                    .await
            ),
            LedgerError::InvalidTicker("LEH".to_string())
        );

        let receipt = delisted
            .sell(&session.id, "LEH", dec!(15), day(18), Some("delisted"), true)
            .await
            .unwrap();
        assert!(receipt.used_fallback_price);
        assert_eq!(receipt.trade.price_per_share, dec!(4));
        assert_eq!(receipt.proceeds, dec!(60));
        // 10 @ 3 then 5 @ 4, sold at 4
        assert_eq!(receipt.realized_profit, dec!(10));
        assert_eq!(delisted.get_holdings(&session.id).unwrap()["LEH"], dec!(5));
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_state_unchanged() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(1000)).await;
        let account = account(&store);
        store.fail_commits();

        let err = account
            .buy(&session.id, "AAPL", dec!(1), day(14), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(store.lot_count(), 0);
        assert_eq!(account.get_cash(&session.id).unwrap(), dec!(1000));
    }

    #[tokio::test]
    async fn test_total_value_is_cash_plus_market_value() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(10000)).await;
        let account = account(&store);
        account.buy(&session.id, "AAPL", dec!(10), day(14), None).await.unwrap();
        account.buy(&session.id, "MSFT", dec!(2), day(15), None).await.unwrap();

        // cash 10000 - 100 - 820 = 9080; AAPL 10 * 30; MSFT 2 * 420
        let total = account.get_total_value(&session.id, day(18)).await.unwrap();
        assert_eq!(total, dec!(10220));

        let valuation = account.get_valuation(&session.id, day(18)).await.unwrap();
        assert_eq!(valuation.cash, dec!(9080));
        assert_eq!(valuation.total_value, total);
        assert_eq!(valuation.cost_basis, dec!(920));

        // No prices on the weekend
        assert!(account.get_total_value(&session.id, day(16)).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_portfolio_values_at_cash_on_any_day() {
        let store = Arc::new(InMemoryStore::new());
        let session = seeded_session(&store, dec!(500)).await;
        let account = account(&store);
        assert_eq!(
            account.get_total_value(&session.id, day(16)).await.unwrap(),
            dec!(500)
        );
        assert!(account.get_holdings(&session.id).unwrap().is_empty());
    }

    mod cash_invariant {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Buy(bool, u32, u8),
            Sell(bool, u32, u8),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (any::<bool>(), 1u32..40, 0u8..4).prop_map(|(m, s, d)| Op::Buy(m, s, d)),
                (any::<bool>(), 1u32..40, 0u8..4).prop_map(|(m, s, d)| Op::Sell(m, s, d)),
            ]
        }

        const DAYS: [u32; 4] = [14, 15, 18, 19];

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn cash_never_goes_negative(ops in proptest::collection::vec(op(), 1..30)) {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let store = Arc::new(InMemoryStore::new());
                    let session = seeded_session(&store, dec!(2000)).await;
                    let account = account(&store);
                    let prices = price_table();

                    for op in ops {
                        let (ticker, shares, d, is_buy) = match op {
                            Op::Buy(m, s, d) => (if m { "MSFT" } else { "AAPL" }, s, d, true),
                            Op::Sell(m, s, d) => (if m { "MSFT" } else { "AAPL" }, s, d, false),
                        };
                        let date = day(DAYS[d as usize]);
                        let shares = Decimal::from(shares);
                        let cash_before = account.get_cash(&session.id).unwrap();
                        let held_before = account
                            .get_holdings(&session.id)
                            .unwrap()
                            .get(ticker)
                            .copied()
                            .unwrap_or_default();

                        let result = if is_buy {
                            account.buy(&session.id, ticker, shares, date, None).await.map(|_| ())
                        } else {
                            account
                                .sell(&session.id, ticker, shares, date, None, false)
                                .await
                                .map(|_| ())
                        };

                        let cash_after = account.get_cash(&session.id).unwrap();
                        assert!(cash_after >= Decimal::ZERO);
                        assert_eq!(cash_after, store.get_by_session(&session.id).unwrap().cash);

                        if result.is_err() {
                            assert_eq!(cash_after, cash_before);
                            let held_after = account
                                .get_holdings(&session.id)
                                .unwrap()
                                .get(ticker)
                                .copied()
                                .unwrap_or_default();
                            assert_eq!(held_after, held_before);
                        } else if is_buy {
                            let price = prices.get_price(ticker, date).await.unwrap();
                            assert_eq!(cash_after, cash_before - shares * price);
                        }
                    }
                });
            }
        }
    }
}
