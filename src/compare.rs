//! Side-by-side comparison of the two accumulation strategies.
//!
//! Runs [`ScheduledInvestor`] and [`DipInvestor`] over the identical series
//! with the identical monthly budget, then scores them metric by metric.
//! The per-metric winners use strict inequalities; the aggregate verdict is
//! an unweighted point tally and is advisory output only — no weighting of
//! units vs cost vs return is authoritative.

use std::fmt;

use crate::engine::{BacktestResult, DipInvestor, DipOutcome, PriceSeries, ScheduledInvestor};
use crate::errors::Result;

/// The two strategies under comparison.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fixed-date monthly DCA.
    ScheduledDca,
    /// Threshold-triggered buy-the-dip.
    BuyTheDip,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScheduledDca => write!(f, "Simple DCA"),
            Self::BuyTheDip => write!(f, "Buy the Dip"),
        }
    }
}

/// The four metrics scored pointwise.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Total units acquired; more is better.
    UnitsAcquired,
    /// Average cost per unit; *less* is better.
    AverageCost,
    /// Return over the period budget; more is better.
    ReturnPct,
    /// Share of the period budget actually deployed; more is better.
    CapitalUtilizationPct,
}

impl Metric {
    /// All scored metrics, in display order.
    pub const ALL: [Metric; 4] = [
        Metric::UnitsAcquired,
        Metric::AverageCost,
        Metric::ReturnPct,
        Metric::CapitalUtilizationPct,
    ];

    /// Reads this metric off a result.
    pub fn value(&self, result: &BacktestResult) -> f64 {
        match self {
            Self::UnitsAcquired => result.total_units(),
            Self::AverageCost => result.average_cost(),
            Self::ReturnPct => result.return_pct(),
            Self::CapitalUtilizationPct => result.capital_utilization_pct(),
        }
    }

    /// True for metrics where the smaller value wins.
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Self::AverageCost)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::UnitsAcquired => "Units acquired",
            Self::AverageCost => "Average cost",
            Self::ReturnPct => "Return %",
            Self::CapitalUtilizationPct => "Capital utilization %",
        }
    }
}

/// Parameters shared by a comparison run.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonParams {
    /// Monthly budget for both strategies: the DCA purchase amount and the
    /// dip engine's monthly stipend.
    pub monthly_budget: f64,
    /// Target purchase day for the scheduled engine.
    pub day_of_month: u32,
    /// Intrabar dip threshold for the dip engine, in percent.
    pub dip_threshold_pct: f64,
    /// Minimum purchase floor for the dip engine.
    pub min_purchase: f64,
}

impl Default for ComparisonParams {
    fn default() -> Self {
        Self {
            monthly_budget: 10_000.0,
            day_of_month: 5,
            dip_threshold_pct: -5.0,
            min_purchase: 100.0,
        }
    }
}

/// The joint outcome of running both strategies over one series.
///
/// Either side can be absent: a dip run over a series with no qualifying dip
/// days produces no result, and the comparison then reports `n/a` for that
/// column and awards no points on unmeasurable metrics.
#[derive(Debug)]
pub struct Comparison {
    params: ComparisonParams,
    scheduled: Option<BacktestResult>,
    dip: Option<DipOutcome>,
}

impl Comparison {
    /// Runs both engines over the same series and stipend.
    pub fn run(series: &PriceSeries, params: ComparisonParams) -> Result<Self> {
        let scheduled =
            ScheduledInvestor::new(params.monthly_budget, params.day_of_month).run(series)?;
        let dip = DipInvestor::new(params.monthly_budget, params.dip_threshold_pct)
            .with_min_purchase(params.min_purchase)
            .run(series)?;

        Ok(Self {
            params,
            scheduled,
            dip,
        })
    }

    /// Returns the parameters of the run.
    pub fn params(&self) -> &ComparisonParams {
        &self.params
    }

    /// Returns the scheduled-DCA result, if any.
    pub fn scheduled(&self) -> Option<&BacktestResult> {
        self.scheduled.as_ref()
    }

    /// Returns the buy-the-dip outcome, if any.
    pub fn dip(&self) -> Option<&DipOutcome> {
        self.dip.as_ref()
    }

    /// Pointwise winner of one metric.
    ///
    /// Strict inequality: ties award no point, and a metric is unmeasurable
    /// (no winner) when either side has no result.
    pub fn winner(&self, metric: Metric) -> Option<Strategy> {
        let scheduled = metric.value(self.scheduled.as_ref()?);
        let dip = metric.value(self.dip.as_ref()?);

        let (better, other) = if metric.lower_is_better() {
            (scheduled < dip, dip < scheduled)
        } else {
            (scheduled > dip, dip > scheduled)
        };

        if better {
            Some(Strategy::ScheduledDca)
        } else if other {
            Some(Strategy::BuyTheDip)
        } else {
            None
        }
    }

    /// Points a strategy collected across the four metrics.
    pub fn score(&self, strategy: Strategy) -> usize {
        Metric::ALL
            .iter()
            .filter(|metric| self.winner(**metric) == Some(strategy))
            .count()
    }

    /// Advisory aggregate verdict: the unweighted point tally across the four
    /// metrics. A heuristic, not a guaranteed-correct ranking — read the
    /// per-metric rows before trusting it.
    pub fn overall(&self) -> Option<Strategy> {
        let scheduled = self.score(Strategy::ScheduledDca);
        let dip = self.score(Strategy::BuyTheDip);
        if scheduled > dip {
            Some(Strategy::ScheduledDca)
        } else if dip > scheduled {
            Some(Strategy::BuyTheDip)
        } else {
            None
        }
    }
}

fn cell(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{value:.precision$}"),
        None => "n/a".to_string(),
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheduled = self.scheduled.as_ref();
        let dip = self.dip.as_ref().map(|o| o.result());

        writeln!(f, "=== Strategy Comparison ===")?;
        writeln!(
            f,
            "{:<24} {:>16} {:>16} {:>14}",
            "Metric", "Simple DCA", "Buy the Dip", "Winner"
        )?;
        writeln!(f, "{}", "-".repeat(74))?;

        // informational rows, no points awarded
        writeln!(
            f,
            "{:<24} {:>16} {:>16} {:>14}",
            "Purchases",
            cell(scheduled.map(|r| r.purchase_count() as f64), 0),
            cell(dip.map(|r| r.purchase_count() as f64), 0),
            ""
        )?;
        writeln!(
            f,
            "{:<24} {:>16} {:>16} {:>14}",
            "Invested",
            cell(scheduled.map(|r| r.total_invested()), 2),
            cell(dip.map(|r| r.total_invested()), 2),
            ""
        )?;
        writeln!(
            f,
            "{:<24} {:>16} {:>16} {:>14}",
            "Total value",
            cell(scheduled.map(|r| r.total_value()), 2),
            cell(dip.map(|r| r.total_value()), 2),
            ""
        )?;

        for metric in Metric::ALL {
            let precision = if metric == Metric::UnitsAcquired { 8 } else { 2 };
            let winner = self
                .winner(metric)
                .map(|s| s.to_string())
                .unwrap_or_default();
            writeln!(
                f,
                "{:<24} {:>16} {:>16} {:>14}",
                metric.label(),
                cell(scheduled.map(|r| metric.value(r)), precision),
                cell(dip.map(|r| metric.value(r)), precision),
                winner
            )?;
        }

        writeln!(f, "{}", "-".repeat(74))?;
        match self.overall() {
            Some(winner) => writeln!(
                f,
                "Overall (advisory): {winner} ({}/{} points)",
                self.score(winner),
                Metric::ALL.len()
            ),
            None => writeln!(f, "Overall (advisory): tied"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{flat_bar, ohlc_bar};

    fn dippy_series() -> PriceSeries {
        // six months of data, one -6% intraday flush in March
        let mut bars = Vec::new();
        for month in 1..=6u32 {
            for day in [5, 12, 19, 26] {
                let base = 100.0 + month as f64 * 10.0;
                if month == 3 && day == 19 {
                    bars.push(ohlc_bar(
                        &format!("2024-{month:02}-{day:02}"),
                        base,
                        base,
                        base * 0.93,
                        base * 0.94,
                    ));
                } else {
                    bars.push(flat_bar(&format!("2024-{month:02}-{day:02}"), base));
                }
            }
        }
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn scheduled_wins_utilization_when_dips_are_rare() {
        let comparison = Comparison::run(&dippy_series(), ComparisonParams::default()).unwrap();

        let scheduled = comparison.scheduled().unwrap();
        let dip = comparison.dip().unwrap();

        assert_eq!(scheduled.purchase_count(), 6);
        assert_eq!(dip.purchase_count(), 1);
        assert_eq!(scheduled.capital_utilization_pct(), 100.0);
        assert!(dip.capital_utilization_pct() < 100.0);
        assert_eq!(
            comparison.winner(Metric::CapitalUtilizationPct),
            Some(Strategy::ScheduledDca)
        );

        // the one dip purchase bought cheaper than the DCA average
        assert_eq!(
            comparison.winner(Metric::AverageCost),
            Some(Strategy::BuyTheDip)
        );

        // scores are consistent with the per-metric winners
        let total = comparison.score(Strategy::ScheduledDca) + comparison.score(Strategy::BuyTheDip);
        assert!(total <= Metric::ALL.len());
    }

    #[test]
    fn missing_dip_result_reports_na_and_no_points() {
        // no bar ever dips: the dip engine produces nothing
        let bars = (2..=28)
            .map(|d| flat_bar(&format!("2024-01-{d:02}"), 100.0))
            .collect::<Vec<_>>();
        let series = PriceSeries::new(bars).unwrap();

        let comparison = Comparison::run(&series, ComparisonParams::default()).unwrap();
        assert!(comparison.dip().is_none());

        for metric in Metric::ALL {
            assert_eq!(comparison.winner(metric), None);
        }
        assert_eq!(comparison.overall(), None);

        let table = comparison.to_string();
        assert!(table.contains("n/a"));
        assert!(table.contains("tied"));
    }

    #[test]
    fn ties_award_no_point() {
        let comparison = Comparison::run(&dippy_series(), ComparisonParams::default()).unwrap();
        // units and return have definite winners here, but the invariant we
        // care about is that no metric is double-counted
        for metric in Metric::ALL {
            let scheduled = comparison.winner(metric) == Some(Strategy::ScheduledDca);
            let dip = comparison.winner(metric) == Some(Strategy::BuyTheDip);
            assert!(!(scheduled && dip));
        }
    }
}
