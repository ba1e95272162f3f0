use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};

/// Today's wall-clock date, used when a session starts without a start date.
pub fn valuation_date_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// True for Monday through Friday. Exchange holidays are not modelled; a
/// price lookup on a holiday simply fails.
pub fn is_market_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The first market day strictly after `date`.
pub fn next_market_day(date: NaiveDate) -> NaiveDate {
    let mut next = date + Duration::days(1);
    while !is_market_day(next) {
        next += Duration::days(1);
    }
    next
}

/// `date` itself when it is a market day, otherwise the following one.
pub fn first_market_day_on_or_after(date: NaiveDate) -> NaiveDate {
    if is_market_day(date) {
        date
    } else {
        next_market_day(date)
    }
}
