use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use log::error;
use rust_decimal::Decimal;

use crate::errors::{Error, LedgerError, Result, ValidationError};
use crate::portfolio::lots::Lot;
use crate::portfolio::valuation::{PortfolioValuation, PositionValuation};

fn overflow(session_id: &str, what: &str) -> Error {
    ValidationError::InvalidInput(format!(
        "value of {} in session {} is out of range",
        what, session_id
    ))
    .into()
}

/// Values `lots` at `prices` (ticker -> close on `target_date`).
///
/// Every held ticker must have a price; a single missing one fails the whole
/// valuation rather than silently undercounting.
pub fn calculate_valuation(
    session_id: &str,
    portfolio_id: &str,
    cash: Decimal,
    lots: &[Lot],
    prices: &HashMap<String, Decimal>,
    target_date: NaiveDate,
) -> Result<PortfolioValuation> {
    // ticker -> (shares, cost basis)
    let mut grouped: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for lot in lots {
        let entry = grouped
            .entry(lot.ticker.as_str())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += lot.shares;
        entry.1 += lot.cost_basis();
    }

    let mut positions = Vec::with_capacity(grouped.len());
    for (ticker, (shares, cost_basis)) in grouped {
        let price = match prices.get(ticker) {
            Some(price) => *price,
            None => {
                error!(
                    "Valuation failed for session {}: no price for {} on {}",
                    session_id, ticker, target_date
                );
                return Err(LedgerError::price_unavailable(
                    ticker,
                    Some(target_date),
                    "missing from valuation prices",
                )
                .into());
            }
        };
        let market_value = shares
            .checked_mul(price)
            .ok_or_else(|| overflow(session_id, ticker))?;
        positions.push(PositionValuation {
            ticker: ticker.to_string(),
            shares,
            price,
            market_value,
            cost_basis,
            unrealized_gain: market_value - cost_basis,
        });
    }

    let investment_market_value = positions
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.market_value))
        .ok_or_else(|| overflow(session_id, "holdings"))?;
    let cost_basis: Decimal = positions.iter().map(|p| p.cost_basis).sum();
    let total_value = cash
        .checked_add(investment_market_value)
        .ok_or_else(|| overflow(session_id, "holdings"))?;

    Ok(PortfolioValuation {
        session_id: session_id.to_string(),
        portfolio_id: portfolio_id.to_string(),
        valuation_date: target_date,
        cash,
        positions,
        investment_market_value,
        cost_basis,
        total_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn lot(ticker: &str, shares: Decimal, price: Decimal) -> Lot {
        Lot::new("p1", "s1", ticker, shares, price, day())
    }

    #[test]
    fn test_total_is_cash_plus_market_value() {
        let lots = vec![
            lot("AAPL", dec!(5), dec!(10)),
            lot("AAPL", dec!(5), dec!(20)),
            lot("MSFT", dec!(1.5), dec!(400)),
        ];
        let prices = HashMap::from([
            ("AAPL".to_string(), dec!(30)),
            ("MSFT".to_string(), dec!(420)),
        ]);

        let valuation = calculate_valuation("s1", "p1", dec!(100), &lots, &prices, day()).unwrap();

        assert_eq!(valuation.positions.len(), 2);
        assert_eq!(valuation.positions[0].ticker, "AAPL");
        assert_eq!(valuation.positions[0].shares, dec!(10));
        assert_eq!(valuation.positions[0].cost_basis, dec!(150));
        assert_eq!(valuation.positions[0].unrealized_gain, dec!(150));
        assert_eq!(valuation.investment_market_value, dec!(930));
        assert_eq!(valuation.total_value, dec!(1030));
    }

    #[test]
    fn test_missing_price_fails_valuation() {
        let lots = vec![lot("AAPL", dec!(1), dec!(10))];
        let err = calculate_valuation("s1", "p1", dec!(0), &lots, &HashMap::new(), day())
            .unwrap_err();
        assert!(matches!(
            err.as_ledger(),
            Some(LedgerError::PriceUnavailable { .. })
        ));
    }

    #[test]
    fn test_out_of_range_price_fails_instead_of_overflowing() {
        let lots = vec![lot("AAPL", dec!(2), dec!(10))];
        let prices = HashMap::from([("AAPL".to_string(), Decimal::MAX)]);
        let err = calculate_valuation("s1", "p1", dec!(0), &lots, &prices, day()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_empty_portfolio_is_all_cash() {
        let valuation =
            calculate_valuation("s1", "p1", dec!(250), &[], &HashMap::new(), day()).unwrap();
        assert!(valuation.positions.is_empty());
        assert_eq!(valuation.total_value, dec!(250));
    }
}
