//! Fetch historical daily candles from the Binance public API.
//!
//! Batch retrieval only: the klines endpoint caps a response at 1000 candles,
//! so longer ranges are walked in windows with a fixed inter-request delay to
//! stay clear of the rate limiter. The row parser is a pure function and
//! testable offline; everything network-shaped funnels through
//! [`fetch_daily_series`].

use std::thread::sleep;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime};

use crate::engine::{BarBuilder, PriceBar, PriceSeries};
use crate::errors::{Error, Result};

const KLINES_URL: &str = "https://api.binance.com/api/v3/klines";
/// Binance caps a single klines response at 1000 rows.
const WINDOW_LIMIT: usize = 1000;
const REQUEST_DELAY: Duration = Duration::from_millis(500);

fn kline_price(value: &serde_json::Value) -> Option<f64> {
    // Binance serializes prices as strings; tolerate plain numbers too
    value
        .as_str()
        .and_then(|raw| raw.parse::<f64>().ok())
        .or_else(|| value.as_f64())
}

/// Parses one klines row into a daily bar.
///
/// A row is `[open_time_ms, open, high, low, close, volume, ...]`; trailing
/// fields (close time, quote volume, trade count, …) are ignored. The bar
/// date is the open time's UTC calendar day.
///
/// # Errors
/// Returns an error for a malformed row or invalid prices.
pub fn bar_from_kline(row: &serde_json::Value) -> Result<PriceBar> {
    let fields = row
        .as_array()
        .filter(|fields| fields.len() >= 6)
        .ok_or_else(|| Error::Http("malformed klines row".to_string()))?;

    let open_time_ms = fields[0]
        .as_i64()
        .or_else(|| fields[0].as_f64().map(|ms| ms as i64))
        .ok_or_else(|| Error::Http("malformed klines open time".to_string()))?;
    let date = DateTime::from_timestamp_millis(open_time_ms)
        .ok_or_else(|| Error::Http("klines open time out of range".to_string()))?
        .date_naive();

    let mut prices = [0.0f64; 5];
    for (slot, field) in prices.iter_mut().zip(&fields[1..6]) {
        *slot = kline_price(field)
            .ok_or_else(|| Error::Http("malformed klines price field".to_string()))?;
    }
    let [open, high, low, close, volume] = prices;

    BarBuilder::builder()
        .date(date)
        .open(open)
        .high(high)
        .low(low)
        .close(close)
        .volume(volume)
        .build()
}

/// Fetches daily bars for `symbol` over `start..=end`, paginated.
///
/// # Arguments
/// * `symbol` - Exchange pair, e.g. `BTCUSDT`.
/// * `start` - First calendar day, inclusive.
/// * `end` - Last calendar day, inclusive.
///
/// # Errors
/// Returns an error on transport failures, non-success HTTP statuses,
/// malformed rows, or an empty overall range.
pub fn fetch_daily_series(symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("stacker-rs/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Http(e.to_string()))?;

    let start_ms = start.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    // exclusive end of the last requested day
    let end_ms = (end + chrono::Duration::days(1))
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
        - 1;

    let mut bars: Vec<PriceBar> = Vec::new();
    let mut cursor_ms = start_ms;

    while cursor_ms < end_ms {
        let response = client
            .get(KLINES_URL)
            .query(&[
                ("symbol", symbol.to_string()),
                ("interval", "1d".to_string()),
                ("startTime", cursor_ms.to_string()),
                ("endTime", end_ms.to_string()),
                ("limit", WINDOW_LIMIT.to_string()),
            ])
            .send()
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "{} returned HTTP {}",
                KLINES_URL,
                response.status()
            )));
        }

        let rows: Vec<serde_json::Value> =
            response.json().map_err(|e| Error::Http(e.to_string()))?;
        if rows.is_empty() {
            break;
        }

        let window_len = rows.len();
        for row in &rows {
            bars.push(bar_from_kline(row)?);
        }

        // resume just past the last candle's open time
        cursor_ms = bars[bars.len() - 1]
            .date()
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp_millis()
            + 1;

        if window_len < WINDOW_LIMIT {
            break;
        }
        sleep(REQUEST_DELAY);
    }

    PriceSeries::new(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_binance_row() {
        // 2024-01-02T00:00:00Z
        let row = json!([
            1704153600000i64,
            "42800.01",
            "43120.50",
            "42500.00",
            "42950.75",
            "18234.123",
            1704239999999i64,
            "781234567.89",
            102055,
            "9000.1",
            "385000000.0",
            "0"
        ]);

        let bar = bar_from_kline(&row).unwrap();
        assert_eq!(bar.date().to_string(), "2024-01-02");
        assert_eq!(bar.open(), 42800.01);
        assert_eq!(bar.high(), 43120.50);
        assert_eq!(bar.low(), 42500.00);
        assert_eq!(bar.close(), 42950.75);
        assert_eq!(bar.volume(), 18234.123);
    }

    #[test]
    fn tolerates_numeric_price_fields() {
        let row = json!([1704153600000i64, 100.0, 110.0, 95.0, 105.0, 12.5]);
        let bar = bar_from_kline(&row).unwrap();
        assert_eq!(bar.close(), 105.0);
    }

    #[test]
    fn rejects_malformed_rows() {
        assert!(matches!(
            bar_from_kline(&json!({"open": 1.0})),
            Err(Error::Http(_))
        ));
        assert!(matches!(
            bar_from_kline(&json!([1704153600000i64, "100.0"])),
            Err(Error::Http(_))
        ));
        assert!(matches!(
            bar_from_kline(&json!([1704153600000i64, "abc", "1", "1", "1", "0"])),
            Err(Error::Http(_))
        ));
    }
}
