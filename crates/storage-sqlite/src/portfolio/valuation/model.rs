use chrono::NaiveDateTime;
use diesel::prelude::*;

use papertrade_core::portfolio::PortfolioLog;

use crate::utils::{format_date, parse_date, parse_decimal};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolio_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioLogDB {
    pub id: String,
    pub portfolio_id: String,
    pub valuation_date: String,
    pub total_value: String,
    pub calculated_at: NaiveDateTime,
}

impl From<PortfolioLogDB> for PortfolioLog {
    fn from(db: PortfolioLogDB) -> Self {
        Self {
            id: db.id,
            portfolio_id: db.portfolio_id,
            valuation_date: parse_date(&db.valuation_date),
            total_value: parse_decimal(&db.total_value),
            calculated_at: db.calculated_at,
        }
    }
}

impl From<&PortfolioLog> for PortfolioLogDB {
    fn from(domain: &PortfolioLog) -> Self {
        Self {
            id: domain.id.clone(),
            portfolio_id: domain.portfolio_id.clone(),
            valuation_date: format_date(domain.valuation_date),
            total_value: domain.total_value.to_string(),
            calculated_at: domain.calculated_at,
        }
    }
}
