use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::lots_model::{Lot, LotChange};
use crate::errors::LedgerError;

/// Outcome of matching a sale against the open lots, before anything is
/// written.
#[derive(Debug, Clone, PartialEq)]
pub struct SalePlan {
    pub changes: Vec<LotChange>,
    pub shares_sold: Decimal,
    pub cost_basis: Decimal,
    pub realized_profit: Decimal,
}

/// The open lots of one ticker in one portfolio, kept in FIFO order.
#[derive(Debug, Clone)]
pub struct LotLedger {
    ticker: String,
    lots: Vec<Lot>,
}

impl LotLedger {
    /// Builds the ledger from `lots`, ignoring lots of other tickers.
    pub fn new(ticker: &str, lots: Vec<Lot>) -> Self {
        let mut lots: Vec<Lot> = lots.into_iter().filter(|l| l.ticker == ticker).collect();
        lots.sort_by(|a, b| a.fifo_cmp(b));
        Self {
            ticker: ticker.to_string(),
            lots,
        }
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn held_shares(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.shares).sum()
    }

    /// Purchase price of the most recently bought lot.
    pub fn last_purchase_price(&self) -> Option<Decimal> {
        self.lots.last().map(|lot| lot.purchase_price)
    }

    /// Matches `shares` against the lots oldest first.
    ///
    /// Lots that fit in the remainder are closed; the final, larger lot is
    /// reduced. Realized profit is `(sale_price - purchase_price) * taken`
    /// summed over the consumed lots.
    pub fn plan_sale(
        &self,
        shares: Decimal,
        sale_price: Decimal,
    ) -> std::result::Result<SalePlan, LedgerError> {
        if shares <= Decimal::ZERO {
            return Err(LedgerError::InvalidQuantity(shares));
        }
        let held = self.held_shares();
        if held < shares {
            return Err(LedgerError::InsufficientShares {
                ticker: self.ticker.clone(),
                requested: shares,
                held,
            });
        }

        let mut remaining = shares;
        let mut changes = Vec::new();
        let mut cost_basis = Decimal::ZERO;
        let mut realized_profit = Decimal::ZERO;

        for lot in &self.lots {
            if remaining <= Decimal::ZERO {
                break;
            }
            let taken = std::cmp::min(lot.shares, remaining);
            let overflow = || LedgerError::InvalidQuantity(shares);
            cost_basis = taken
                .checked_mul(lot.purchase_price)
                .and_then(|cost| cost_basis.checked_add(cost))
                .ok_or_else(overflow)?;
            realized_profit = sale_price
                .checked_sub(lot.purchase_price)
                .and_then(|gain| gain.checked_mul(taken))
                .and_then(|gain| realized_profit.checked_add(gain))
                .ok_or_else(overflow)?;
            remaining -= taken;

            if taken == lot.shares {
                changes.push(LotChange::Close {
                    lot_id: lot.id.clone(),
                });
            } else {
                changes.push(LotChange::Reduce {
                    lot_id: lot.id.clone(),
                    remaining_shares: lot.shares - taken,
                });
            }
        }

        Ok(SalePlan {
            changes,
            shares_sold: shares,
            cost_basis,
            realized_profit,
        })
    }
}

/// Aggregate shares per ticker over `lots`.
pub fn aggregate_holdings(lots: &[Lot]) -> BTreeMap<String, Decimal> {
    let mut holdings = BTreeMap::new();
    for lot in lots {
        *holdings.entry(lot.ticker.clone()).or_insert(Decimal::ZERO) += lot.shares;
    }
    holdings
}
