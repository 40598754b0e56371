use chrono::NaiveDate;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The price data provided is empty. A simulation requires at least one bar.
    #[error("Price series is empty: a simulation requires at least one bar")]
    SeriesEmpty,

    /// A bar carries a non-positive or non-finite price. Identifies the offending
    /// row so bad upstream data can be located.
    #[error("Non-positive {field} price on {date}: {value}")]
    NonPositivePrice {
        /// Calendar day of the offending bar.
        date: NaiveDate,
        /// Which OHLC field failed validation.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A bar builder is missing a required field.
    #[error("Bar is missing required field: {0}")]
    IncompleteBar(&'static str),

    /// Two bars share the same calendar day. Dates must be unique.
    #[error("Duplicate bar date: {0}")]
    DuplicateDate(NaiveDate),

    /// The monthly amount or stipend is not positive.
    #[error("Investment amount must be positive (got: {0})")]
    NonPositiveAmount(f64),

    /// The target day of month is outside 1..=31.
    #[error("Day of month must be within 1..=31 (got: {0})")]
    InvalidDayOfMonth(u32),

    /// A purchase attempted to spend a non-positive cash amount. This is a bug
    /// in the calling engine, not a data problem.
    #[error("Purchase spend must be positive (got: {0})")]
    NonPositiveSpend(f64),

    /// A required column is missing from an input file header.
    #[error("Missing column in input file: {0}")]
    MissingColumn(&'static str),

    /// A numeric field failed to parse while loading a file.
    #[error("Cannot parse {field} on line {line}")]
    ParseNumber {
        /// 1-based line number in the input file.
        line: usize,
        /// Column name of the unparseable field.
        field: &'static str,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error occurred.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A date string failed to parse.
    #[error("Date parse error: {0}")]
    ParseDate(#[from] chrono::ParseError),

    /// JSON serialization/deserialization error occurred.
    #[cfg(any(feature = "serde", feature = "fetch"))]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Chart backend error occurred.
    #[cfg(feature = "draws")]
    #[error("Plotters error: {0}")]
    Plotters(String),

    /// HTTP request to the market-data endpoint failed.
    #[cfg(feature = "fetch")]
    #[error("HTTP error: {0}")]
    Http(String),
}
