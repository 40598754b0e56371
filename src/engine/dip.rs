use std::fmt;
use std::ops::Deref;

use crate::Percentage;
use crate::errors::{Error, Result};

use super::{BacktestResult, Ledger, PriceSeries};

/// Flat accrual approximation: a monthly stipend spreads over 30 days,
/// regardless of the actual calendar month length.
const ACCRUAL_DAYS_PER_MONTH: f64 = 30.0;

/// Floor below which accrued cash is not worth spending on a dip.
const DEFAULT_MIN_PURCHASE: f64 = 100.0;

/// Buy the dip: accrue a daily cash stipend, spend all of it whenever a day
/// drops hard enough.
///
/// Each bar accrues `monthly_stipend / 30` of cash. When a bar's
/// [intrabar return](crate::engine::PriceBar::intrabar_return) is at or below
/// the threshold, the engine spends the *entire* accrued balance at that
/// bar's close — unless the balance is still under the minimum purchase
/// floor, in which case the dip is counted as a missed opportunity and the
/// cash keeps accruing.
///
/// Note the trigger is the intrabar return (close vs the same day's open),
/// not the close-to-close return the seasonal reducers use.
#[derive(Debug, Clone, Copy)]
pub struct DipInvestor {
    monthly_stipend: f64,
    dip_threshold_pct: f64,
    min_purchase: f64,
}

impl DipInvestor {
    /// Creates the engine with the default minimum purchase floor (100).
    ///
    /// ### Arguments
    /// * `monthly_stipend` - Cash budget accrued per month.
    /// * `dip_threshold_pct` - Intrabar return at or below which a day counts
    ///   as a dip (e.g. -5.0 for a 5% intraday drop).
    pub fn new(monthly_stipend: f64, dip_threshold_pct: f64) -> Self {
        Self {
            monthly_stipend,
            dip_threshold_pct,
            min_purchase: DEFAULT_MIN_PURCHASE,
        }
    }

    /// Overrides the minimum purchase floor.
    pub fn with_min_purchase(mut self, min_purchase: f64) -> Self {
        self.min_purchase = min_purchase;
        self
    }

    /// Returns the monthly stipend.
    pub fn monthly_stipend(&self) -> f64 {
        self.monthly_stipend
    }

    /// Returns the dip threshold in percent.
    pub fn dip_threshold_pct(&self) -> f64 {
        self.dip_threshold_pct
    }

    /// Returns the minimum purchase floor.
    pub fn min_purchase(&self) -> f64 {
        self.min_purchase
    }

    /// Runs the simulation over the series.
    ///
    /// The period budget (`total_should_save`) is `bar_count × stipend / 30`,
    /// and the return is measured against it, so cash that never found a dip
    /// suppresses the apparent return rather than vanishing from the
    /// accounting. Accrued-but-unspent cash is reported as leftover.
    ///
    /// ### Returns
    /// `Ok(None)` when no dip day breached the threshold with enough cash —
    /// zero purchases is a reportable outcome, not an error.
    pub fn run(&self, series: &PriceSeries) -> Result<Option<DipOutcome>> {
        if !self.monthly_stipend.is_finite() || self.monthly_stipend <= 0.0 {
            return Err(Error::NonPositiveAmount(self.monthly_stipend));
        }
        if !self.min_purchase.is_finite() || self.min_purchase <= 0.0 {
            return Err(Error::NonPositiveAmount(self.min_purchase));
        }

        let daily_accrual = self.monthly_stipend / ACCRUAL_DAYS_PER_MONTH;
        let mut ledger = Ledger::new();
        let mut accumulated_cash = 0.0;
        let mut dip_days = 0;
        let mut missed_opportunities = 0;

        for bar in series.bars() {
            accumulated_cash += daily_accrual;

            if bar.intrabar_return() <= self.dip_threshold_pct {
                dip_days += 1;
                if accumulated_cash >= self.min_purchase {
                    ledger.record(bar.date(), bar.close(), accumulated_cash)?;
                    accumulated_cash = 0.0;
                } else {
                    // dip seen but the balance is under the floor; keep accruing
                    missed_opportunities += 1;
                }
            }
        }

        let total_should_save = series.len() as f64 * daily_accrual;
        let result = BacktestResult::from_ledger(
            ledger,
            series.last_close(),
            accumulated_cash,
            total_should_save,
        );

        Ok(result.map(|result| DipOutcome {
            result,
            dip_days,
            missed_opportunities,
        }))
    }
}

/// A [`BacktestResult`] plus the dip-specific counters.
///
/// Dereferences to the inner result, so all the usual accessors apply.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DipOutcome {
    result: BacktestResult,
    dip_days: usize,
    missed_opportunities: usize,
}

impl Deref for DipOutcome {
    type Target = BacktestResult;

    fn deref(&self) -> &Self::Target {
        &self.result
    }
}

impl DipOutcome {
    /// Returns the inner backtest result.
    pub fn result(&self) -> &BacktestResult {
        &self.result
    }

    /// Consumes the outcome, returning the inner result.
    pub fn into_result(self) -> BacktestResult {
        self.result
    }

    /// Returns how many days breached the dip threshold.
    pub fn dip_days(&self) -> usize {
        self.dip_days
    }

    /// Returns how many dips passed without a purchase for lack of cash.
    pub fn missed_opportunities(&self) -> usize {
        self.missed_opportunities
    }

    /// Returns the share of dip days that actually produced a purchase.
    pub fn purchase_rate_pct(&self) -> f64 {
        (self.result.purchase_count() as f64).pct_share(self.dip_days as f64)
    }
}

impl fmt::Display for DipOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.result, f)?;
        writeln!(f, "Dip days: {}", self.dip_days)?;
        writeln!(f, "Missed opportunities: {}", self.missed_opportunities)?;
        writeln!(f, "Purchase rate: {:.1}% of dip days", self.purchase_rate_pct())
    }
}

#[cfg(test)]
use super::bar::{flat_bar, ohlc_bar};

#[cfg(test)]
#[test]
fn rejects_invalid_parameters() {
    let series = PriceSeries::new(vec![flat_bar("2024-01-05", 100.0)]).unwrap();

    let result = DipInvestor::new(-1.0, -5.0).run(&series);
    assert!(matches!(result, Err(Error::NonPositiveAmount(_))));

    let result = DipInvestor::new(3000.0, -5.0)
        .with_min_purchase(0.0)
        .run(&series);
    assert!(matches!(result, Err(Error::NonPositiveAmount(_))));
}

#[cfg(test)]
#[test]
fn threshold_boundary_is_inclusive() {
    // exactly -5% intrabar counts as a dip
    let series = PriceSeries::new(vec![
        flat_bar("2024-01-02", 100.0),
        ohlc_bar("2024-01-03", 100.0, 100.0, 94.0, 95.0),
    ])
    .unwrap();

    // 3000/month accrues 100/day: two bars make exactly 200 by the dip day
    let outcome = DipInvestor::new(3000.0, -5.0)
        .run(&series)
        .unwrap()
        .unwrap();

    assert_eq!(outcome.dip_days(), 1);
    assert_eq!(outcome.purchase_count(), 1);
    assert_eq!(outcome.total_invested(), 200.0);
    assert_eq!(outcome.leftover_cash(), 0.0);
    assert_eq!(outcome.purchase_rate_pct(), 100.0);
}
