use std::fmt;
use std::ops::Range;

use chrono::{Datelike, NaiveDate};

use super::{PriceBar, PriceSeries};

/// A (year, calendar month) grouping key.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1..=12.
    pub month: u32,
}

impl From<NaiveDate> for MonthKey {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Partitions a series into chronological calendar months.
///
/// ### Returns
/// One `(key, index range)` pair per distinct (year, month) present in the
/// series. Ranges index into the full series, so reducers keep access to the
/// whole-series daily returns.
pub fn month_ranges(series: &PriceSeries) -> Vec<(MonthKey, Range<usize>)> {
    let bars = series.as_slice();
    let mut ranges = Vec::new();
    let mut start = 0;

    for end in 1..=bars.len() {
        let boundary =
            end == bars.len() || MonthKey::from(bars[end].date()) != MonthKey::from(bars[start].date());
        if boundary {
            ranges.push((MonthKey::from(bars[start].date()), start..end));
            start = end;
        }
    }

    ranges
}

/// Resolves the purchase day within one month of trading dates.
///
/// Policy: the earliest bar whose day-of-month is on or after the target day.
/// When the target day falls past the month's last trading date (say day 31 in
/// a month whose data ends on the 28th), the last bar is used instead. This
/// fallback is the expected behavior for sparse calendars, never an error.
///
/// ### Arguments
/// * `month_bars` - The bars of a single calendar month, in date order.
/// * `day_of_month` - The target calendar day, 1..=31.
///
/// ### Returns
/// The index of the purchase bar within `month_bars`, or `None` when the
/// month has no bars at all.
pub fn resolve_purchase_index(month_bars: &[PriceBar], day_of_month: u32) -> Option<usize> {
    if month_bars.is_empty() {
        return None;
    }

    month_bars
        .iter()
        .position(|bar| bar.date().day() >= day_of_month)
        .or(Some(month_bars.len() - 1))
}

#[cfg(test)]
use super::bar::flat_bar;

#[cfg(test)]
#[test]
fn earliest_on_or_after_target() {
    // trading days 3, 4, 5, 8, 9 with target 7: the 8th is the purchase day
    let bars = [3, 4, 5, 8, 9]
        .map(|d| flat_bar(&format!("2024-01-{d:02}"), 100.0))
        .to_vec();

    let index = resolve_purchase_index(&bars, 7).unwrap();
    assert_eq!(bars[index].date().day(), 8);

    let index = resolve_purchase_index(&bars, 3).unwrap();
    assert_eq!(bars[index].date().day(), 3);
}

#[cfg(test)]
#[test]
fn falls_back_to_last_trading_day() {
    // data ends on the 28th, target day 31: fall back to the 28th
    let bars = [5, 12, 28]
        .map(|d| flat_bar(&format!("2024-02-{d:02}"), 100.0))
        .to_vec();

    let index = resolve_purchase_index(&bars, 31).unwrap();
    assert_eq!(bars[index].date().day(), 28);
}

#[cfg(test)]
#[test]
fn empty_month_yields_none() {
    assert_eq!(resolve_purchase_index(&[], 5), None);
}

#[cfg(test)]
#[test]
fn month_ranges_partition() {
    let series = PriceSeries::new(vec![
        flat_bar("2023-12-30", 100.0),
        flat_bar("2023-12-31", 101.0),
        flat_bar("2024-01-02", 102.0),
        flat_bar("2024-01-15", 103.0),
        flat_bar("2024-03-01", 104.0),
    ])
    .unwrap();

    let ranges = month_ranges(&series);
    assert_eq!(
        ranges,
        vec![
            (MonthKey { year: 2023, month: 12 }, 0..2),
            (MonthKey { year: 2024, month: 1 }, 2..4),
            (MonthKey { year: 2024, month: 3 }, 4..5),
        ]
    );
}
