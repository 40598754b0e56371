//! Core simulation components.
//!
//! This module provides the fundamental types for accumulation backtests:
//! - `PriceBar` / `PriceSeries`: validated daily OHLCV data.
//! - `MonthKey` / `resolve_purchase_index`: calendar scheduling with fallback.
//! - `ScheduledInvestor`: fixed-date monthly DCA.
//! - `DipInvestor`: threshold-triggered buy-the-dip with daily cash accrual.
//! - `Purchase` / `BacktestResult`: the immutable outputs of a run.

mod bar;
mod dip;
mod ledger;
mod schedule;
mod scheduled;

use std::fmt;

use crate::Percentage;

pub use bar::*;
pub use dip::*;
pub use ledger::Purchase;
pub(crate) use ledger::Ledger;
pub use schedule::*;
pub use scheduled::*;

#[cfg(test)]
mod sim;

#[cfg(test)]
pub(crate) use bar::{flat_bar, ohlc_bar};

/// The immutable outcome of a completed simulation run.
///
/// Constructed once, at the end of a run that executed at least one purchase.
/// A run with zero purchases produces no result at all (the engines return
/// `Ok(None)`), so none of these fields can be division-by-zero artifacts.
///
/// Returns are measured against [`BacktestResult::total_should_save`] — the
/// budget the saver set aside over the whole period — not merely against the
/// cash actually spent. Cash left idle drags the return down, which is the
/// point: a strategy that rarely deploys its budget should not look better
/// for it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    total_invested: f64,
    total_units: f64,
    average_cost: f64,
    final_price: f64,
    holdings_value: f64,
    leftover_cash: f64,
    total_should_save: f64,
    total_return: f64,
    return_pct: f64,
    purchases: Vec<Purchase>,
}

impl BacktestResult {
    /// Builds the result from a finished ledger, or `None` when nothing was
    /// ever purchased.
    pub(crate) fn from_ledger(
        ledger: Ledger,
        final_price: f64,
        leftover_cash: f64,
        total_should_save: f64,
    ) -> Option<Self> {
        if ledger.is_empty() {
            return None;
        }

        let total_invested = ledger.total_invested();
        let total_units = ledger.total_units();
        let holdings_value = total_units * final_price;
        let total_return = holdings_value + leftover_cash - total_should_save;

        Some(Self {
            total_invested,
            total_units,
            average_cost: total_invested / total_units,
            final_price,
            holdings_value,
            leftover_cash,
            total_should_save,
            total_return,
            return_pct: total_should_save.pct_change(holdings_value + leftover_cash),
            purchases: ledger.into_purchases(),
        })
    }

    /// Returns the total cash actually spent on purchases.
    pub fn total_invested(&self) -> f64 {
        self.total_invested
    }

    /// Returns the total units acquired.
    pub fn total_units(&self) -> f64 {
        self.total_units
    }

    /// Returns the average cost per unit, `total_invested / total_units`.
    pub fn average_cost(&self) -> f64 {
        self.average_cost
    }

    /// Returns the last close price of the simulated series.
    pub fn final_price(&self) -> f64 {
        self.final_price
    }

    /// Returns the value of the acquired units at the final price.
    pub fn holdings_value(&self) -> f64 {
        self.holdings_value
    }

    /// Returns the accrued cash never deployed by the end of the run.
    pub fn leftover_cash(&self) -> f64 {
        self.leftover_cash
    }

    /// Returns the budget over the whole period: what the saver should have
    /// set aside, whether or not it was spent.
    pub fn total_should_save(&self) -> f64 {
        self.total_should_save
    }

    /// Returns holdings plus leftover cash.
    pub fn total_value(&self) -> f64 {
        self.holdings_value + self.leftover_cash
    }

    /// Returns the absolute gain over the period budget.
    pub fn total_return(&self) -> f64 {
        self.total_return
    }

    /// Returns the percentage gain over the period budget.
    pub fn return_pct(&self) -> f64 {
        self.return_pct
    }

    /// Returns how much of the period budget was actually deployed, in percent.
    pub fn capital_utilization_pct(&self) -> f64 {
        self.total_invested.pct_share(self.total_should_save)
    }

    /// Returns the number of executed purchases.
    pub fn purchase_count(&self) -> usize {
        self.purchases.len()
    }

    /// Returns the ordered purchase log.
    pub fn purchases(&self) -> std::slice::Iter<'_, Purchase> {
        self.purchases.iter()
    }

    /// Returns the first purchase of the run.
    pub fn first_purchase(&self) -> &Purchase {
        &self.purchases[0]
    }

    /// Returns the last purchase of the run.
    pub fn last_purchase(&self) -> &Purchase {
        &self.purchases[self.purchases.len() - 1]
    }
}

impl fmt::Display for BacktestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Backtest Result ===")?;
        writeln!(f, "Purchases: {}", self.purchase_count())?;
        writeln!(
            f,
            "Period: {} to {}",
            self.first_purchase().date(),
            self.last_purchase().date()
        )?;
        writeln!(f, "Invested: {:.2}", self.total_invested)?;
        writeln!(f, "Units acquired: {:.8}", self.total_units)?;
        writeln!(f, "Average cost: {:.2}", self.average_cost)?;
        writeln!(f, "Final price: {:.2}", self.final_price)?;
        writeln!(f, "Holdings value: {:.2}", self.holdings_value)?;
        writeln!(f, "Leftover cash: {:.2}", self.leftover_cash)?;
        writeln!(f, "Period budget: {:.2}", self.total_should_save)?;
        writeln!(
            f,
            "Return: {:+.2} ({:+.2}%)",
            self.total_return, self.return_pct
        )?;
        writeln!(
            f,
            "Capital utilization: {:.2}%",
            self.capital_utilization_pct()
        )
    }
}
