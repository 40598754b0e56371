use crate::errors::{Error, Result};

use super::{BacktestResult, Ledger, PriceSeries, month_ranges, resolve_purchase_index};

/// Simple DCA: one fixed-amount purchase per calendar month.
///
/// For every (year, month) with at least one trading date, the purchase date
/// is resolved by [`resolve_purchase_index`] (earliest date on or after the
/// target day, else the month's last date) and the full monthly amount is
/// spent at that bar's close.
///
/// Every monthly budget is deployed, so `total_should_save` equals the
/// invested total and capital utilization reads 100% by construction.
#[derive(Debug, Clone, Copy)]
pub struct ScheduledInvestor {
    monthly_amount: f64,
    day_of_month: u32,
}

impl ScheduledInvestor {
    /// Creates the engine.
    ///
    /// ### Arguments
    /// * `monthly_amount` - Cash to invest each month.
    /// * `day_of_month` - Target calendar day, 1..=31.
    pub fn new(monthly_amount: f64, day_of_month: u32) -> Self {
        Self {
            monthly_amount,
            day_of_month,
        }
    }

    /// Returns the monthly investment amount.
    pub fn monthly_amount(&self) -> f64 {
        self.monthly_amount
    }

    /// Returns the target day of month.
    pub fn day_of_month(&self) -> u32 {
        self.day_of_month
    }

    /// Runs the simulation over the series.
    ///
    /// Exactly one purchase is executed per month that has data; totals are
    /// monotonically non-decreasing across the log. The run is a pure function
    /// of (series, parameters).
    ///
    /// ### Returns
    /// The result, or an error for invalid parameters. `Ok(None)` is the
    /// zero-purchase case, which a non-empty series never produces.
    pub fn run(&self, series: &PriceSeries) -> Result<Option<BacktestResult>> {
        if !self.monthly_amount.is_finite() || self.monthly_amount <= 0.0 {
            return Err(Error::NonPositiveAmount(self.monthly_amount));
        }
        if !(1..=31).contains(&self.day_of_month) {
            return Err(Error::InvalidDayOfMonth(self.day_of_month));
        }

        let mut ledger = Ledger::new();
        for (_, range) in month_ranges(series) {
            let month_bars = &series.as_slice()[range];
            let Some(index) = resolve_purchase_index(month_bars, self.day_of_month) else {
                continue;
            };
            let bar = &month_bars[index];
            ledger.record(bar.date(), bar.close(), self.monthly_amount)?;
        }

        // one purchase per month: the period budget is exactly what was spent
        let total_should_save = ledger.total_invested();
        Ok(BacktestResult::from_ledger(
            ledger,
            series.last_close(),
            0.0,
            total_should_save,
        ))
    }
}

#[cfg(test)]
use super::bar::flat_bar;

#[cfg(test)]
#[test]
fn rejects_invalid_parameters() {
    let series = PriceSeries::new(vec![flat_bar("2024-01-05", 100.0)]).unwrap();

    let result = ScheduledInvestor::new(0.0, 5).run(&series);
    assert!(matches!(result, Err(Error::NonPositiveAmount(_))));

    let result = ScheduledInvestor::new(1000.0, 0).run(&series);
    assert!(matches!(result, Err(Error::InvalidDayOfMonth(0))));

    let result = ScheduledInvestor::new(1000.0, 32).run(&series);
    assert!(matches!(result, Err(Error::InvalidDayOfMonth(32))));
}

#[cfg(test)]
#[test]
fn one_purchase_per_month_with_data() {
    // three months, uneven coverage, one of them a single-bar month
    let series = PriceSeries::new(vec![
        flat_bar("2024-01-03", 100.0),
        flat_bar("2024-01-20", 110.0),
        flat_bar("2024-02-28", 120.0),
        flat_bar("2024-04-05", 90.0),
        flat_bar("2024-04-06", 95.0),
    ])
    .unwrap();

    let result = ScheduledInvestor::new(500.0, 5)
        .run(&series)
        .unwrap()
        .unwrap();

    assert_eq!(result.purchase_count(), 3);
    assert_eq!(result.total_invested(), 1500.0);
    assert_eq!(result.capital_utilization_pct(), 100.0);
    assert_eq!(result.leftover_cash(), 0.0);

    let dates = result
        .purchases()
        .map(|p| p.date().to_string())
        .collect::<Vec<_>>();
    // Jan: earliest >= 5 is the 20th; Feb: only the 28th exists; Apr: the 5th
    assert_eq!(dates, vec!["2024-01-20", "2024-02-28", "2024-04-05"]);
}
