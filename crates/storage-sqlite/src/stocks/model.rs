use diesel::prelude::*;

use papertrade_core::tickers::Stock;

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::stocks)]
#[diesel(primary_key(symbol))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StockDB {
    pub symbol: String,
    pub name: String,
}

impl From<StockDB> for Stock {
    fn from(db: StockDB) -> Self {
        Self {
            symbol: db.symbol,
            name: db.name,
        }
    }
}

impl From<Stock> for StockDB {
    fn from(domain: Stock) -> Self {
        Self {
            symbol: domain.symbol,
            name: domain.name,
        }
    }
}
