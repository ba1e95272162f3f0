/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// How long a latest quote stays fresh in the price cache.
pub const DEFAULT_QUOTE_TTL_SECS: u64 = 120;

/// Rationale recorded when the driver does not supply one.
pub const DEFAULT_RATIONALE: &str = "None provided";

/// Name given to sessions created without one.
pub const DEFAULT_SESSION_NAME: &str = "Untitled Session";

/// Tickers tradable when no registry is configured.
pub const DEFAULT_UNIVERSE: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc."),
    ("AMZN", "Amazon.com, Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("META", "Meta Platforms, Inc."),
    ("TSLA", "Tesla, Inc."),
    ("JPM", "JPMorgan Chase & Co."),
    ("V", "Visa Inc."),
    ("JNJ", "Johnson & Johnson"),
    ("WMT", "Walmart Inc."),
    ("PG", "The Procter & Gamble Company"),
    ("XOM", "Exxon Mobil Corporation"),
    ("DIS", "The Walt Disney Company"),
    ("NFLX", "Netflix, Inc."),
    ("KO", "The Coca-Cola Company"),
    ("PEP", "PepsiCo, Inc."),
    ("INTC", "Intel Corporation"),
    ("AMD", "Advanced Micro Devices, Inc."),
    ("BAC", "Bank of America Corporation"),
];
