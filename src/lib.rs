//! # Stacker: backtest accumulation strategies on daily OHLCV data
//!
//! **Stacker** answers a retail-investor question with historical candle data:
//! if I had put a fixed budget into an asset every month, or held the cash back
//! and bought every sharp dip, which plan would have left me with more units,
//! a better average cost and a better return?
//!
//! It is a retrospective toolkit, not a trading system: it consumes a loaded
//! daily price series and produces structured results for reporting, export
//! or charting.
//!
//! ## Core Components
//! | Component   | Description                                                                     |
//! |-------------|---------------------------------------------------------------------------------|
//! | **`PriceBar` / `PriceSeries`** | Validated daily OHLCV data, sorted and gap-tolerant, with precomputed whole-series daily returns. |
//! | **`ScheduledInvestor`** | Fixed-amount purchase once per calendar month on a target day (simple DCA). |
//! | **`DipInvestor`** | Accrues a daily cash stipend and spends it all whenever a day drops past a threshold. |
//! | **`Comparison`** | Runs both engines on the same series and scores them metric by metric. |
//! | **`seasonal`** | Monthly returns and drawdowns, cross-year seasonality, per-weekday/day-of-month aggregates. |
//! | **`Sweep`** | Parallel parameter sweeps (all 12 target months, dip-threshold grids). |
//!
//! ## Getting Started
//! ```rust
//! use stacker_rs::prelude::*;
//! use chrono::NaiveDate;
//!
//! fn bar(date: &str, close: f64) -> PriceBar {
//!     BarBuilder::builder()
//!         .date(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap())
//!         .open(close)
//!         .high(close)
//!         .low(close)
//!         .close(close)
//!         .volume(1.0)
//!         .build()
//!         .unwrap()
//! }
//!
//! let series = PriceSeries::new(vec![
//!     bar("2024-01-05", 100.0),
//!     bar("2024-02-05", 120.0),
//!     bar("2024-03-05", 80.0),
//! ])
//! .unwrap();
//!
//! // 1000 per month, buying on (or after) the 5th
//! let dca = ScheduledInvestor::new(1000.0, 5);
//! let result = dca.run(&series).unwrap().expect("series has months");
//!
//! assert_eq!(result.total_invested(), 3000.0);
//! assert_eq!(result.purchase_count(), 3);
//! println!("{result}");
//! ```
//!
//! ## Money Invariants
//! Every purchase log upholds, exactly and at every step:
//! - `total_invested == sum of cash spent`
//! - `total_units == sum of units acquired`
//! - average cost is always recomputed from the cumulative totals.
//!
//! A run is a pure function of (series, parameters): re-running it yields a
//! bit-identical result.
//!
//! ## Two "daily returns"
//! The crate deliberately keeps two separately-named return computations:
//! [`engine::PriceSeries::close_to_close`] (against the previous bar's close,
//! used by the seasonal reducers) and
//! [`engine::PriceBar::intrabar_return`] (close against the same bar's open,
//! the dip trigger). They are different numbers; do not substitute one for
//! the other.
//!
//! ## Features
//! | Feature     | Description                                                   |
//! |-------------|---------------------------------------------------------------|
//! | `draws`     | Chart rendering via [`plotters`](https://crates.io/crates/plotters) *(default)*. |
//! | `serde`     | Serde derives on results + JSON ingestion.                    |
//! | `optimizer` | Parallel parameter sweeps via [`rayon`](https://crates.io/crates/rayon). |
//! | `fetch`     | Blocking Binance daily-kline fetcher via [`reqwest`](https://crates.io/crates/reqwest). |
//!
//! ## License
//! MIT
#![warn(missing_docs)]

/// Simulation engine: price series, calendar scheduling, the two investor
/// engines and their results.
pub mod engine;

/// Error types for the library.
pub mod errors;

/// Side-by-side strategy comparison with per-metric winners.
pub mod compare;

/// Seasonal reducers: monthly returns/drawdowns, cross-year seasonality,
/// per-period daily statistics.
pub mod seasonal;

/// CSV/JSON ingestion and purchase-log export.
pub mod loader;

/// Parameter sweeps over strategy grids.
#[cfg(feature = "optimizer")]
pub mod optimizer;

/// Draw price history, purchase points and comparison charts.
#[cfg(feature = "draws")]
pub mod draws;

/// Fetch historical daily candles from Binance.
#[cfg(feature = "fetch")]
pub mod fetch;

/// Re-exports of commonly used types and traits for convenience.
pub mod prelude {
    pub use super::*;
    pub use crate::compare::*;
    pub use crate::engine::*;
    pub use crate::errors::*;
    pub use crate::seasonal::*;

    #[cfg(feature = "optimizer")]
    pub use crate::optimizer::*;

    #[cfg(feature = "draws")]
    pub use crate::draws::*;
}

/// Trait for the percentage arithmetic used throughout the crate.
///
/// Return figures, win rates and capital-utilization shares are all percentage
/// values; this keeps their formulas in one place instead of scattering
/// `* 100.0` across the reducers.
pub trait Percentage<Rhs = Self> {
    /// Percentage change from `self` to `new`.
    ///
    /// ### Arguments
    /// * `new` - The new value to compare with.
    ///
    /// ### Returns
    /// `(new - self) / self * 100`.
    fn pct_change(self, new: Rhs) -> Self;

    /// The share of `whole` that `self` represents, as a percentage.
    ///
    /// ### Arguments
    /// * `whole` - The reference total.
    ///
    /// ### Returns
    /// `self / whole * 100`.
    fn pct_share(self, whole: Rhs) -> Self;

    /// Grows `self` by a percentage (compounding step).
    ///
    /// ### Arguments
    /// * `percent` - The growth rate (e.g. 10.0 for +10%).
    ///
    /// ### Returns
    /// `self * (1 + percent / 100)`.
    fn grow_by(self, percent: Rhs) -> Self;
}

impl Percentage for f64 {
    fn pct_change(self, new: Self) -> Self {
        (new - self) / self * 100.0
    }

    fn pct_share(self, whole: Self) -> Self {
        self / whole * 100.0
    }

    fn grow_by(self, percent: Self) -> Self {
        self * (1.0 + percent / 100.0)
    }
}

#[cfg(test)]
mod percent {
    use super::*;

    #[test]
    fn change() {
        assert_eq!(10.0, 100.0.pct_change(110.0));
        assert_eq!(-20.0, 100.0.pct_change(80.0));
    }

    #[test]
    fn share() {
        assert_eq!(25.0, 25.0.pct_share(100.0));
        assert_eq!(50.0, 600.0.pct_share(1200.0));
    }

    #[test]
    fn grow() {
        assert_eq!(110.0, 100.0.grow_by(10.0));
        assert_eq!(121.0, 100.0.grow_by(10.0).grow_by(10.0));
    }
}
