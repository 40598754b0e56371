use chrono::NaiveDate;

use crate::errors::{Error, Result};

/// A single executed purchase, immutable once appended to an engine's log.
///
/// The cumulative fields are exact running sums over the log up to and
/// including this purchase; the average cost is recomputed from those totals
/// at append time, never incrementally averaged.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    date: NaiveDate,
    price: f64,
    cash_spent: f64,
    units: f64,
    total_cash_spent: f64,
    total_units: f64,
    average_cost: f64,
}

impl Purchase {
    /// Returns the execution date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the execution price (the bar's close).
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Returns the cash spent on this purchase.
    pub fn cash_spent(&self) -> f64 {
        self.cash_spent
    }

    /// Returns the units acquired by this purchase.
    pub fn units(&self) -> f64 {
        self.units
    }

    /// Returns the cumulative cash spent up to and including this purchase.
    pub fn total_cash_spent(&self) -> f64 {
        self.total_cash_spent
    }

    /// Returns the cumulative units held up to and including this purchase.
    pub fn total_units(&self) -> f64 {
        self.total_units
    }

    /// Returns the running average cost, `total_cash_spent / total_units`.
    pub fn average_cost(&self) -> f64 {
        self.average_cost
    }
}

/// Accumulator for a single simulation run: invested cash, acquired units and
/// the ordered purchase log.
///
/// All money arithmetic funnels through [`Ledger::record`], which keeps the
/// conservation invariant (`total_invested == Σ cash_spent`,
/// `total_units == Σ units`) by storing the running sums themselves on each
/// purchase.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    total_invested: f64,
    total_units: f64,
    purchases: Vec<Purchase>,
}

impl Ledger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Executes a purchase: spends `cash` at `price` on `date`.
    ///
    /// ### Returns
    /// Ok if recorded, or a data-integrity error for a non-positive price or
    /// a non-positive spend.
    pub(crate) fn record(&mut self, date: NaiveDate, price: f64, cash: f64) -> Result<()> {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::NonPositivePrice {
                date,
                field: "close",
                value: price,
            });
        }
        if !cash.is_finite() || cash <= 0.0 {
            return Err(Error::NonPositiveSpend(cash));
        }

        let units = cash / price;
        self.total_invested += cash;
        self.total_units += units;
        self.purchases.push(Purchase {
            date,
            price,
            cash_spent: cash,
            units,
            total_cash_spent: self.total_invested,
            total_units: self.total_units,
            average_cost: self.total_invested / self.total_units,
        });
        Ok(())
    }

    pub(crate) fn total_invested(&self) -> f64 {
        self.total_invested
    }

    pub(crate) fn total_units(&self) -> f64 {
        self.total_units
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.purchases.is_empty()
    }

    pub(crate) fn into_purchases(self) -> Vec<Purchase> {
        self.purchases
    }
}

#[cfg(test)]
fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
}

#[cfg(test)]
#[test]
fn record_updates_totals() {
    let mut ledger = Ledger::new();
    ledger.record(day(2), 100.0, 1000.0).unwrap();

    assert_eq!(ledger.total_invested(), 1000.0);
    assert_eq!(ledger.total_units(), 10.0);

    ledger.record(day(3), 200.0, 1000.0).unwrap();

    assert_eq!(ledger.total_invested(), 2000.0);
    assert_eq!(ledger.total_units(), 15.0);
}

#[cfg(test)]
#[test]
fn record_rejects_bad_inputs() {
    let mut ledger = Ledger::new();

    let result = ledger.record(day(2), 0.0, 1000.0);
    assert!(matches!(result, Err(Error::NonPositivePrice { .. })));

    let result = ledger.record(day(2), 100.0, -5.0);
    assert!(matches!(result, Err(Error::NonPositiveSpend(_))));

    // nothing was appended
    assert!(ledger.is_empty());
    assert_eq!(ledger.total_invested(), 0.0);
}

#[cfg(test)]
#[test]
fn conservation_and_monotonicity() {
    let mut ledger = Ledger::new();
    ledger.record(day(2), 100.0, 333.33).unwrap();
    ledger.record(day(5), 80.0, 1250.0).unwrap();
    ledger.record(day(9), 125.0, 16.67).unwrap();

    let total_invested = ledger.total_invested();
    let total_units = ledger.total_units();
    let purchases = ledger.into_purchases();

    // exact sums, not approximations: the ledger stores its own running sums
    assert_eq!(
        purchases.iter().map(Purchase::cash_spent).sum::<f64>(),
        total_invested
    );
    assert_eq!(
        purchases.iter().map(Purchase::units).sum::<f64>(),
        total_units
    );

    for pair in purchases.windows(2) {
        assert!(pair[1].total_cash_spent() >= pair[0].total_cash_spent());
        assert!(pair[1].total_units() >= pair[0].total_units());
        assert!(pair[1].date() > pair[0].date());
    }
}

#[cfg(test)]
#[test]
fn average_cost_from_cumulative_totals() {
    let mut ledger = Ledger::new();
    ledger.record(day(2), 100.0, 100.0).unwrap();
    ledger.record(day(3), 200.0, 100.0).unwrap();

    let purchases = ledger.into_purchases();
    // 200 spent for 1.5 units, not the midpoint of the two prices
    let expected = 200.0 / 1.5;
    assert!((purchases[1].average_cost() - expected).abs() < 1e-12);
    assert_ne!(purchases[1].average_cost(), 150.0);
}
