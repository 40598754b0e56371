//! Load price series from disk and export purchase logs.
//!
//! The CSV layout follows the exchange-export convention: one row per trading
//! day with `timestamp/date, open, high, low, close, volume` columns (header
//! names are case-insensitive, extra columns are ignored, rows may arrive
//! unordered — the series sorts on construction). Loading is collaborator
//! glue: all validation lives in [`BarBuilder`] and [`PriceSeries`].

use std::io;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::engine::{BacktestResult, BarBuilder, PriceSeries};
use crate::errors::{Error, Result};

/// Accepted timestamp layouts, tried in order.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn parse_bar_date(raw: &str) -> Result<NaiveDate> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Ok(date),
        Err(error) => {
            for format in DATETIME_FORMATS.iter().copied() {
                if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
                    return Ok(datetime.date());
                }
            }
            Err(Error::ParseDate(error))
        }
    }
}

fn column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.contains(&header.to_ascii_lowercase().as_str()))
}

fn number(record: &StringRecord, index: usize, line: usize, field: &'static str) -> Result<f64> {
    record
        .get(index)
        .and_then(|raw| raw.parse::<f64>().ok())
        .ok_or(Error::ParseNumber { line, field })
}

/// Reads daily bars from any CSV reader.
///
/// # Errors
/// Returns an error when a required column is missing, a row fails to parse
/// (the error names the line and field), or the assembled series is invalid.
pub fn series_from_reader<R: io::Read>(reader: R) -> Result<PriceSeries> {
    let mut csv = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv.headers()?.clone();

    let date_col = column(&headers, &["timestamp", "date"]).ok_or(Error::MissingColumn("timestamp"))?;
    let open_col = column(&headers, &["open"]).ok_or(Error::MissingColumn("open"))?;
    let high_col = column(&headers, &["high"]).ok_or(Error::MissingColumn("high"))?;
    let low_col = column(&headers, &["low"]).ok_or(Error::MissingColumn("low"))?;
    let close_col = column(&headers, &["close"]).ok_or(Error::MissingColumn("close"))?;
    // some exports (coin-level OHLC dumps) carry no volume column
    let volume_col = column(&headers, &["volume"]);

    let mut bars = Vec::new();
    for (index, record) in csv.records().enumerate() {
        let record = record?;
        if record.is_empty() {
            continue;
        }
        let line = index + 2; // 1-based, after the header

        let raw_date = record.get(date_col).ok_or(Error::ParseNumber {
            line,
            field: "timestamp",
        })?;
        let volume = match volume_col {
            Some(col) => number(&record, col, line, "volume")?,
            None => 0.0,
        };

        bars.push(
            BarBuilder::builder()
                .date(parse_bar_date(raw_date)?)
                .open(number(&record, open_col, line, "open")?)
                .high(number(&record, high_col, line, "high")?)
                .low(number(&record, low_col, line, "low")?)
                .close(number(&record, close_col, line, "close")?)
                .volume(volume)
                .build()?,
        );
    }

    PriceSeries::new(bars)
}

/// Reads daily bars from a CSV file.
///
/// # Errors
/// See [`series_from_reader`].
pub fn series_from_csv(path: impl AsRef<Path>) -> Result<PriceSeries> {
    series_from_reader(std::fs::File::open(path)?)
}

/// Reads daily bars from a JSON file holding an array of bar objects.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
#[cfg(feature = "serde")]
pub fn series_from_json(path: impl AsRef<Path>) -> Result<PriceSeries> {
    let file = std::fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let bars = serde_json::from_reader(reader)?;
    PriceSeries::new(bars)
}

/// Writes a result's purchase log as CSV, one row per purchase with the
/// running totals alongside.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_purchases_csv(result: &BacktestResult, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record([
        "date",
        "price",
        "cash_spent",
        "units",
        "total_cash_spent",
        "total_units",
        "average_cost",
    ])?;

    for purchase in result.purchases() {
        writer.write_record(&[
            purchase.date().format("%Y-%m-%d").to_string(),
            format!("{:.8}", purchase.price()),
            format!("{:.8}", purchase.cash_spent()),
            format!("{:.8}", purchase.units()),
            format!("{:.8}", purchase.total_cash_spent()),
            format!("{:.8}", purchase.total_units()),
            format!("{:.8}", purchase.average_cost()),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_unordered_rows_with_datetime_stamps() {
        let csv = "\
timestamp,open,high,low,close,volume,quote_volume
2024-01-03 00:00:00,110,112,108,111,20,999
2024-01-02 00:00:00,100,105,99,104,10,999
2024-01-04 00:00:00,111,115,110,114,30,999
";
        let series = series_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.first().date().to_string(), "2024-01-02");
        assert_eq!(series.first().close(), 104.0);
        assert_eq!(series.last().volume(), 30.0);
    }

    #[test]
    fn tolerates_missing_volume_column() {
        let csv = "\
date,open,high,low,close
2024-01-02,100,105,99,104
";
        let series = series_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(series.first().volume(), 0.0);
    }

    #[test]
    fn names_the_offending_row_on_parse_failure() {
        let csv = "\
timestamp,open,high,low,close,volume
2024-01-02,100,105,99,104,10
2024-01-03,110,112,oops,111,20
";
        let result = series_from_reader(csv.as_bytes());
        assert!(matches!(
            result,
            Err(Error::ParseNumber {
                line: 3,
                field: "low"
            })
        ));
    }

    #[test]
    fn rejects_missing_required_column() {
        let csv = "date,open,high,low,volume\n2024-01-02,100,105,99,10\n";
        let result = series_from_reader(csv.as_bytes());
        assert!(matches!(result, Err(Error::MissingColumn("close"))));
    }

    #[test]
    fn exports_the_purchase_log() {
        use crate::engine::{PriceSeries, ScheduledInvestor, flat_bar};

        let series = PriceSeries::new(vec![
            flat_bar("2024-01-05", 100.0),
            flat_bar("2024-02-05", 125.0),
        ])
        .unwrap();
        let result = ScheduledInvestor::new(1000.0, 5)
            .run(&series)
            .unwrap()
            .unwrap();

        let path = std::env::temp_dir().join("stacker_purchases_export_test.csv");
        write_purchases_csv(&result, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,price,cash_spent,units,total_cash_spent,total_units,average_cost"
        );
        assert!(lines.next().unwrap().starts_with("2024-01-05,100.0"));
        assert!(lines.next().unwrap().starts_with("2024-02-05,125.0"));
        assert_eq!(lines.next(), None);
    }
}
