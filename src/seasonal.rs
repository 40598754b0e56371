//! Seasonal reducers over a price series.
//!
//! Three independent aggregations, all built on the same precomputed
//! whole-series daily returns:
//! - [`monthly_breakdown`]: per (year, month) return, intra-month max
//!   drawdown and worst single-day drop — where the bad months live.
//! - [`monthly_seasonality`]: cross-year statistics per calendar month
//!   (win rate, mean, median of month-over-month returns).
//! - [`daily_stats`]: daily-return aggregates grouped by calendar month,
//!   day of month, weekday or year.

use chrono::Datelike;

use crate::Percentage;
use crate::engine::{MonthKey, PriceSeries, month_ranges};

/// Return, drawdown and worst-day figures for one calendar month.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStats {
    month: MonthKey,
    open: f64,
    close: f64,
    return_pct: f64,
    max_drawdown_pct: f64,
    max_daily_drop_pct: f64,
    bar_count: usize,
}

impl MonthlyStats {
    /// Returns the (year, month) key.
    pub fn month(&self) -> MonthKey {
        self.month
    }

    /// Returns the month's first open price.
    pub fn open(&self) -> f64 {
        self.open
    }

    /// Returns the month's last close price.
    pub fn close(&self) -> f64 {
        self.close
    }

    /// Returns the month's return: last close against first open, in percent.
    pub fn return_pct(&self) -> f64 {
        self.return_pct
    }

    /// Returns the deepest intra-month peak-to-trough decline, in percent
    /// (negative). Peaks track the running maximum of `high`, restarted at the
    /// month start; troughs read each bar's `low`.
    pub fn max_drawdown_pct(&self) -> f64 {
        self.max_drawdown_pct
    }

    /// Returns the worst single-day intrabar return of the month, in percent.
    pub fn max_daily_drop_pct(&self) -> f64 {
        self.max_daily_drop_pct
    }

    /// Returns how many bars the month had.
    pub fn bar_count(&self) -> usize {
        self.bar_count
    }
}

/// Computes the per-month breakdown for every calendar month in the series.
///
/// Months with fewer than 2 bars cannot produce a meaningful return and are
/// skipped entirely rather than emitted as zeros.
pub fn monthly_breakdown(series: &PriceSeries) -> Vec<MonthlyStats> {
    month_ranges(series)
        .into_iter()
        .filter_map(|(month, range)| {
            let bars = &series.as_slice()[range];
            if bars.len() < 2 {
                return None;
            }

            let open = bars[0].open();
            let close = bars[bars.len() - 1].close();

            let mut running_high = f64::NEG_INFINITY;
            let mut max_drawdown_pct = 0.0f64;
            let mut max_daily_drop_pct = f64::INFINITY;
            for bar in bars {
                running_high = running_high.max(bar.high());
                max_drawdown_pct = max_drawdown_pct.min(running_high.pct_change(bar.low()));
                max_daily_drop_pct = max_daily_drop_pct.min(bar.intrabar_return());
            }

            Some(MonthlyStats {
                month,
                open,
                close,
                return_pct: open.pct_change(close),
                max_drawdown_pct,
                max_daily_drop_pct,
                bar_count: bars.len(),
            })
        })
        .collect()
}

/// Cross-year statistics for one calendar month.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalStats {
    month: u32,
    years: usize,
    win_rate_pct: f64,
    mean_return_pct: f64,
    median_return_pct: f64,
}

impl SeasonalStats {
    /// Returns the calendar month, 1..=12.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns how many yearly samples the month has.
    pub fn years(&self) -> usize {
        self.years
    }

    /// Returns the share of years in which the month closed positive.
    pub fn win_rate_pct(&self) -> f64 {
        self.win_rate_pct
    }

    /// Returns the mean month-over-month return across years.
    pub fn mean_return_pct(&self) -> f64 {
        self.mean_return_pct
    }

    /// Returns the median month-over-month return across years.
    pub fn median_return_pct(&self) -> f64 {
        self.median_return_pct
    }
}

/// Computes cross-year seasonality: one return sample per (calendar month,
/// year), pivoted into per-month win rate, mean and median.
///
/// The series is resampled to month-end closes; each sample is a month-end
/// close against the previous month-end close. The first observed month has
/// no predecessor and contributes no sample, so a month appears in the output
/// only once it has at least one complete month-over-month observation.
pub fn monthly_seasonality(series: &PriceSeries) -> Vec<SeasonalStats> {
    let month_ends = month_ranges(series)
        .into_iter()
        .map(|(month, range)| (month, series.as_slice()[range.end - 1].close()))
        .collect::<Vec<_>>();

    let mut pivot: [Vec<f64>; 12] = Default::default();
    for pair in month_ends.windows(2) {
        let (month, close) = pair[1];
        let (_, previous_close) = pair[0];
        pivot[(month.month - 1) as usize].push(previous_close.pct_change(close));
    }

    pivot
        .iter()
        .enumerate()
        .filter(|(_, samples)| !samples.is_empty())
        .map(|(index, samples)| {
            let wins = samples.iter().filter(|r| **r > 0.0).count();
            let mut sorted = samples.clone();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let mid = sorted.len() / 2;
            let median_return_pct = if sorted.len() % 2 == 1 {
                sorted[mid]
            } else {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            };

            SeasonalStats {
                month: index as u32 + 1,
                years: samples.len(),
                win_rate_pct: (wins as f64).pct_share(samples.len() as f64),
                mean_return_pct: samples.iter().sum::<f64>() / samples.len() as f64,
                median_return_pct,
            }
        })
        .collect()
}

/// How to group daily returns for [`daily_stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Calendar month, key 1..=12.
    Month,
    /// Day of month, key 1..=31.
    DayOfMonth,
    /// Weekday, key 1 (Monday) ..= 7 (Sunday).
    Weekday,
    /// Calendar year.
    Year,
}

/// Daily-return aggregate for one group key.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodStats {
    key: i32,
    count: usize,
    mean_return_pct: f64,
    volatility_pct: Option<f64>,
    min_return_pct: f64,
    max_return_pct: f64,
}

impl PeriodStats {
    /// Returns the group key (meaning depends on the [`Grouping`]).
    pub fn key(&self) -> i32 {
        self.key
    }

    /// Returns the number of daily-return samples in the group.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the mean daily return, in percent.
    pub fn mean_return_pct(&self) -> f64 {
        self.mean_return_pct
    }

    /// Returns the sample standard deviation of daily returns, or `None` for
    /// groups with a single sample.
    pub fn volatility_pct(&self) -> Option<f64> {
        self.volatility_pct
    }

    /// Returns the worst daily return of the group.
    pub fn min_return_pct(&self) -> f64 {
        self.min_return_pct
    }

    /// Returns the best daily return of the group.
    pub fn max_return_pct(&self) -> f64 {
        self.max_return_pct
    }
}

/// Groups the whole-series close-to-close daily returns by a calendar period
/// and aggregates each group.
///
/// Returns are always taken from the full series, so the first bar of a
/// subgroup keeps its return against the bar that actually preceded it (an
/// August 1st compares against July 31st, not against another August bar).
/// The series' first bar has no return and belongs to no group. Output is
/// sorted by key.
pub fn daily_stats(series: &PriceSeries, grouping: Grouping) -> Vec<PeriodStats> {
    let mut groups: std::collections::BTreeMap<i32, Vec<f64>> = std::collections::BTreeMap::new();
    for (index, bar) in series.bars().enumerate() {
        let Some(daily_return) = series.daily_return(index) else {
            continue;
        };
        let key = match grouping {
            Grouping::Month => bar.date().month() as i32,
            Grouping::DayOfMonth => bar.date().day() as i32,
            Grouping::Weekday => bar.date().weekday().number_from_monday() as i32,
            Grouping::Year => bar.date().year(),
        };
        groups.entry(key).or_default().push(daily_return);
    }

    groups
        .into_iter()
        .map(|(key, samples)| {
            let count = samples.len();
            let mean = samples.iter().sum::<f64>() / count as f64;
            let volatility_pct = (count > 1).then(|| {
                let sum_sq = samples.iter().map(|r| (r - mean).powi(2)).sum::<f64>();
                (sum_sq / (count - 1) as f64).sqrt()
            });

            PeriodStats {
                key,
                count,
                mean_return_pct: mean,
                volatility_pct,
                min_return_pct: samples.iter().copied().fold(f64::INFINITY, f64::min),
                max_return_pct: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            }
        })
        .collect()
}

/// Compounds a sequence of per-bar percentage returns into a total return.
///
/// ### Returns
/// `((1 + r1/100)(1 + r2/100)… - 1) × 100`.
pub fn compound_return(returns: impl IntoIterator<Item = f64>) -> f64 {
    let growth = returns.into_iter().fold(1.0f64, |acc, r| acc.grow_by(r));
    (growth - 1.0) * 100.0
}

/// Month-to-date compounded return of one calendar month, per year.
///
/// Compounds the whole-series daily returns of every bar falling in `month`,
/// separately for each year. The month's first bar contributes its return
/// against the previous month's last close, matching how a month-to-date
/// figure reads on a chart.
pub fn month_over_years(series: &PriceSeries, month: u32) -> Vec<(i32, f64)> {
    let mut per_year: Vec<(i32, Vec<f64>)> = Vec::new();
    for (index, bar) in series.bars().enumerate() {
        if bar.date().month() != month {
            continue;
        }
        let Some(daily_return) = series.daily_return(index) else {
            continue;
        };
        let year = bar.date().year();
        match per_year.last_mut() {
            Some((last_year, returns)) if *last_year == year => returns.push(daily_return),
            _ => per_year.push((year, vec![daily_return])),
        }
    }

    per_year
        .into_iter()
        .map(|(year, returns)| (year, compound_return(returns)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{PriceSeries, flat_bar, ohlc_bar};

    fn assert_close(actual: f64, expected: f64, epsilon: f64) {
        assert!(
            (actual - expected).abs() < epsilon,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn breakdown_drawdown_from_rolling_high() {
        let series = PriceSeries::new(vec![
            ohlc_bar("2024-01-02", 100.0, 110.0, 95.0, 105.0),
            ohlc_bar("2024-01-03", 105.0, 120.0, 100.0, 118.0),
            ohlc_bar("2024-01-04", 118.0, 115.0, 90.0, 92.0),
        ])
        .unwrap();

        let breakdown = monthly_breakdown(&series);
        assert_eq!(breakdown.len(), 1);
        let month = &breakdown[0];

        // running highs 110, 120, 120; deepest trough is 90 against 120
        assert_close(month.max_drawdown_pct(), -25.0, 1e-9);
        // (92 - 100) / 100
        assert_close(month.return_pct(), -8.0, 1e-9);
        // worst intrabar day: (92 - 118) / 118
        assert_close(month.max_daily_drop_pct(), -22.033898305084747, 1e-9);
        assert_eq!(month.bar_count(), 3);
    }

    #[test]
    fn breakdown_skips_single_bar_months() {
        let series = PriceSeries::new(vec![
            flat_bar("2024-01-05", 100.0),
            flat_bar("2024-02-05", 110.0),
            flat_bar("2024-02-06", 112.0),
        ])
        .unwrap();

        let breakdown = monthly_breakdown(&series);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].month().month, 2);
    }

    #[test]
    fn drawdown_restarts_each_month() {
        // January peaks at 200 before February opens at 100. If the running
        // high leaked across the boundary, February would show a ~-50%
        // drawdown; restarted, its worst trough is 100 against its own 103
        let series = PriceSeries::new(vec![
            ohlc_bar("2024-01-30", 190.0, 200.0, 185.0, 195.0),
            ohlc_bar("2024-01-31", 195.0, 199.0, 190.0, 192.0),
            ohlc_bar("2024-02-01", 100.0, 101.0, 99.0, 100.5),
            ohlc_bar("2024-02-02", 100.5, 103.0, 100.0, 102.0),
        ])
        .unwrap();

        let breakdown = monthly_breakdown(&series);
        let february = &breakdown[1];
        // (100 - 103) / 103, not (99 - 200) / 200
        assert_close(february.max_drawdown_pct(), -2.912621359223301, 1e-9);
    }

    #[test]
    fn seasonality_win_rate_and_median() {
        // month-end closes: Jan..Mar for two years; February returns are
        // +10% (2023: 100 -> 110) and -5% (2024: 200 -> 190)
        let series = PriceSeries::new(vec![
            flat_bar("2023-01-31", 100.0),
            flat_bar("2023-02-28", 110.0),
            flat_bar("2023-03-31", 99.0),
            flat_bar("2024-01-31", 200.0),
            flat_bar("2024-02-29", 190.0),
            flat_bar("2024-03-31", 209.0),
        ])
        .unwrap();

        let stats = monthly_seasonality(&series);
        let february = stats.iter().find(|s| s.month() == 2).unwrap();

        assert_eq!(february.years(), 2);
        assert_close(february.win_rate_pct(), 50.0, 1e-9);
        assert_close(february.mean_return_pct(), 2.5, 1e-9);
        assert_close(february.median_return_pct(), 2.5, 1e-9);

        // January 2023 is the first observed month-end: no sample for it,
        // so January only carries the 2024 observation
        let january = stats.iter().find(|s| s.month() == 1).unwrap();
        assert_eq!(january.years(), 1);
    }

    #[test]
    fn daily_stats_group_by_weekday() {
        // 2024-01-01 is a Monday
        let series = PriceSeries::new(vec![
            flat_bar("2024-01-01", 100.0),
            flat_bar("2024-01-02", 110.0),
            flat_bar("2024-01-08", 99.0),
            flat_bar("2024-01-09", 108.9),
        ])
        .unwrap();

        let stats = daily_stats(&series, Grouping::Weekday);
        // the first Monday has no return; only the second contributes
        let monday = stats.iter().find(|s| s.key() == 1).unwrap();
        assert_eq!(monday.count(), 1);
        assert_close(monday.mean_return_pct(), -10.0, 1e-9);
        assert!(monday.volatility_pct().is_none());

        let tuesday = stats.iter().find(|s| s.key() == 2).unwrap();
        assert_eq!(tuesday.count(), 2);
        assert_close(tuesday.mean_return_pct(), 10.0, 1e-9);
        assert_close(tuesday.volatility_pct().unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn compound_two_ten_percent_days() {
        assert_close(compound_return([10.0, 10.0]), 21.0, 1e-9);
        assert_close(compound_return([]), 0.0, 1e-12);
    }

    #[test]
    fn month_to_date_uses_full_series_returns() {
        // August 1st gets its return against July 31st's close
        let series = PriceSeries::new(vec![
            flat_bar("2024-07-31", 100.0),
            flat_bar("2024-08-01", 110.0),
            flat_bar("2024-08-02", 121.0),
        ])
        .unwrap();

        let by_year = month_over_years(&series, 8);
        assert_eq!(by_year.len(), 1);
        let (year, total) = by_year[0];
        assert_eq!(year, 2024);
        assert_close(total, 21.0, 1e-9);
    }
}
