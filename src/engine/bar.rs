use chrono::NaiveDate;

use crate::Percentage;
use crate::errors::{Error, Result};

/// A single daily OHLCV record.
///
/// Prices are validated to be positive and finite at build time; the OHLC
/// ordering (`high >= max(open, close)` and so on) is an upstream data-quality
/// assumption and is not enforced here.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl PriceBar {
    /// Returns the calendar day of the bar.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the open price.
    pub fn open(&self) -> f64 {
        self.open
    }

    /// Returns the high price.
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Returns the low price.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Returns the close price.
    pub fn close(&self) -> f64 {
        self.close
    }

    /// Returns the traded volume.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Intrabar return: close against the *same* bar's open, in percent.
    ///
    /// This is the dip-trigger quantity. It is not the same number as
    /// [`PriceSeries::close_to_close`], which compares against the previous
    /// bar's close; the two are kept as separately named computations.
    pub fn intrabar_return(&self) -> f64 {
        self.open.pct_change(self.close)
    }
}

/// Builder for [`PriceBar`] with price validation.
///
/// ### Example
/// ```rust
/// use stacker_rs::engine::BarBuilder;
/// use chrono::NaiveDate;
///
/// let bar = BarBuilder::builder()
///     .date(NaiveDate::from_ymd_opt(2024, 8, 5).unwrap())
///     .open(100.0)
///     .high(110.0)
///     .low(95.0)
///     .close(105.0)
///     .volume(1.0)
///     .build()
///     .unwrap();
///
/// assert_eq!(bar.close(), 105.0);
/// ```
#[derive(Debug, Default)]
pub struct BarBuilder {
    date: Option<NaiveDate>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

impl BarBuilder {
    /// Creates an empty builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Sets the calendar day.
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the open price.
    pub fn open(mut self, open: f64) -> Self {
        self.open = Some(open);
        self
    }

    /// Sets the high price.
    pub fn high(mut self, high: f64) -> Self {
        self.high = Some(high);
        self
    }

    /// Sets the low price.
    pub fn low(mut self, low: f64) -> Self {
        self.low = Some(low);
        self
    }

    /// Sets the close price.
    pub fn close(mut self, close: f64) -> Self {
        self.close = Some(close);
        self
    }

    /// Sets the traded volume.
    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Validates and builds the bar.
    ///
    /// ### Returns
    /// The bar, or an error naming the missing or invalid field and the
    /// offending date.
    pub fn build(self) -> Result<PriceBar> {
        let date = self.date.ok_or(Error::IncompleteBar("date"))?;
        let open = self.open.ok_or(Error::IncompleteBar("open"))?;
        let high = self.high.ok_or(Error::IncompleteBar("high"))?;
        let low = self.low.ok_or(Error::IncompleteBar("low"))?;
        let close = self.close.ok_or(Error::IncompleteBar("close"))?;
        let volume = self.volume.ok_or(Error::IncompleteBar("volume"))?;

        for (field, value) in [("open", open), ("high", high), ("low", low), ("close", close)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::NonPositivePrice { date, field, value });
            }
        }
        if !volume.is_finite() || volume < 0.0 {
            return Err(Error::NonPositivePrice {
                date,
                field: "volume",
                value: volume,
            });
        }

        Ok(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// An ordered, gap-tolerant daily price series with unique ascending dates.
///
/// Construction sorts the input and precomputes the whole-series close-to-close
/// daily returns. Reducers that analyze a subrange (one month, every August)
/// index into these precomputed returns, so the first bar of a subrange keeps
/// its return against the bar that actually preceded it in the full series.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
    returns: Vec<Option<f64>>,
}

impl PriceSeries {
    /// Creates a series from bars in any order.
    ///
    /// ### Arguments
    /// * `bars` - The daily bars; they are sorted by date here.
    ///
    /// ### Returns
    /// The series, or an error for empty input or duplicate dates.
    pub fn new(mut bars: Vec<PriceBar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(Error::SeriesEmpty);
        }

        bars.sort_by_key(PriceBar::date);
        for pair in bars.windows(2) {
            if pair[0].date() == pair[1].date() {
                return Err(Error::DuplicateDate(pair[1].date()));
            }
        }

        let returns = std::iter::once(None)
            .chain(
                bars.windows(2)
                    .map(|pair| Some(pair[0].close().pct_change(pair[1].close()))),
            )
            .collect();

        Ok(Self { bars, returns })
    }

    /// Returns an iterator over the bars in date order.
    pub fn bars(&self) -> std::slice::Iter<'_, PriceBar> {
        self.bars.iter()
    }

    /// Returns the bars as a slice.
    pub fn as_slice(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Returns the bar at `index`.
    pub fn get(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    /// Returns the number of bars.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; an empty series cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Returns the first bar.
    pub fn first(&self) -> &PriceBar {
        &self.bars[0]
    }

    /// Returns the last bar.
    pub fn last(&self) -> &PriceBar {
        &self.bars[self.bars.len() - 1]
    }

    /// Returns the last close price of the series.
    pub fn last_close(&self) -> f64 {
        self.last().close()
    }

    /// Whole-series close-to-close daily returns in percent, aligned with the
    /// bars; `None` for the first bar, which has no predecessor.
    pub fn close_to_close(&self) -> &[Option<f64>] {
        &self.returns
    }

    /// The close-to-close return of the bar at `index`, if it has one.
    pub fn daily_return(&self, index: usize) -> Option<f64> {
        self.returns.get(index).copied().flatten()
    }
}

#[cfg(test)]
pub(crate) fn flat_bar(date: &str, close: f64) -> PriceBar {
    ohlc_bar(date, close, close, close, close)
}

#[cfg(test)]
pub(crate) fn ohlc_bar(date: &str, open: f64, high: f64, low: f64, close: f64) -> PriceBar {
    BarBuilder::builder()
        .date(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap())
        .open(open)
        .high(high)
        .low(low)
        .close(close)
        .volume(1.0)
        .build()
        .unwrap()
}

#[cfg(test)]
#[test]
fn builder_rejects_non_positive_price() {
    let result = BarBuilder::builder()
        .date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        .open(100.0)
        .high(110.0)
        .low(0.0)
        .close(105.0)
        .volume(1.0)
        .build();
    assert!(matches!(
        result,
        Err(Error::NonPositivePrice { field: "low", .. })
    ));

    let result = BarBuilder::builder()
        .date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        .open(100.0)
        .high(f64::NAN)
        .low(90.0)
        .close(105.0)
        .volume(1.0)
        .build();
    assert!(matches!(
        result,
        Err(Error::NonPositivePrice { field: "high", .. })
    ));
}

#[cfg(test)]
#[test]
fn builder_rejects_missing_field() {
    let result = BarBuilder::builder().open(100.0).build();
    assert!(matches!(result, Err(Error::IncompleteBar("date"))));
}

#[cfg(test)]
#[test]
fn series_rejects_empty_and_duplicates() {
    assert!(matches!(PriceSeries::new(vec![]), Err(Error::SeriesEmpty)));

    let result = PriceSeries::new(vec![
        flat_bar("2024-01-02", 100.0),
        flat_bar("2024-01-02", 101.0),
    ]);
    assert!(matches!(result, Err(Error::DuplicateDate(_))));
}

#[cfg(test)]
#[test]
fn series_sorts_unordered_input() {
    let series = PriceSeries::new(vec![
        flat_bar("2024-01-04", 120.0),
        flat_bar("2024-01-02", 100.0),
        flat_bar("2024-01-03", 110.0),
    ])
    .unwrap();

    let closes = series.bars().map(PriceBar::close).collect::<Vec<_>>();
    assert_eq!(closes, vec![100.0, 110.0, 120.0]);
}

#[cfg(test)]
#[test]
fn close_to_close_returns() {
    let series = PriceSeries::new(vec![
        flat_bar("2024-01-02", 100.0),
        flat_bar("2024-01-03", 110.0),
        flat_bar("2024-01-04", 121.0),
    ])
    .unwrap();

    assert_eq!(series.daily_return(0), None);
    assert_eq!(series.daily_return(1), Some(10.0));
    assert_eq!(series.daily_return(2), Some(10.0));
}

#[cfg(test)]
#[test]
fn intrabar_and_cross_bar_returns_diverge() {
    // Gap up to 120 at the open, fade to 110 by the close: the day is +10%
    // against yesterday's close but -8.33% intrabar. Both engines depend on
    // their own definition; this pins the difference down.
    let series = PriceSeries::new(vec![
        flat_bar("2024-01-02", 100.0),
        ohlc_bar("2024-01-03", 120.0, 121.0, 109.0, 110.0),
    ])
    .unwrap();

    assert_eq!(series.daily_return(1), Some(10.0));
    let intrabar = series.get(1).unwrap().intrabar_return();
    assert!((intrabar - (-8.333333333333334)).abs() < 1e-12);
}
