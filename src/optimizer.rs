//! Strategy parameter sweeps.
//!
//! A backtest run is a pure function of (series, parameters), which makes
//! parameter sweeps embarrassingly parallel: the `Sweep` struct fans a grid
//! of combinations out over worker threads against one shared, immutable
//! series. The `ParameterGrid` trait defines how to generate the grid —
//! all 12 DCA target months, a range of dip thresholds, whatever the
//! question calls for.

use std::marker::PhantomData;

use crate::engine::PriceSeries;
use crate::errors::Result;

use rayon::prelude::*;

/// Trait defining how to generate parameter combinations for a sweep.
///
/// Implement this for a marker type to describe the grid. The associated type
/// `Output` is a single combination (e.g. `u32` for a target day, or a tuple).
pub trait ParameterGrid: Sync {
    /// Type representing a single parameter combination.
    type Output: Clone + Send + Sync;

    /// Generates all parameter combinations to evaluate.
    ///
    /// # Returns
    /// A vector containing every combination.
    fn generate() -> Vec<Self::Output>;
}

/// Parallel sweep runner over one immutable price series.
///
/// Combinations are split into one chunk per logical CPU; each chunk runs its
/// evaluations sequentially on its worker.
pub struct Sweep<'s, PG: ParameterGrid> {
    series: &'s PriceSeries,
    _marker: PhantomData<PG>,
}

impl<'s, PG: ParameterGrid> Sweep<'s, PG> {
    /// Creates a sweep over the given series.
    pub fn new(series: &'s PriceSeries) -> Self {
        Self {
            series,
            _marker: PhantomData,
        }
    }

    /// Evaluates every combination of the grid.
    ///
    /// # Arguments
    /// * `evaluate` - Pure evaluation of one combination against the series
    ///   (typically: build an engine, run it, pick a figure of merit).
    ///
    /// # Returns
    /// One `(combination, outcome)` pair per grid entry, in grid order.
    ///
    /// # Errors
    /// Returns the first evaluation error encountered.
    pub fn run<E, R>(&self, evaluate: E) -> Result<Vec<(PG::Output, R)>>
    where
        E: Fn(&PriceSeries, &PG::Output) -> Result<R> + Sync,
        R: Send,
    {
        let num_cpus = num_cpus::get();
        let combinations = PG::generate();
        let chunk_size = combinations.len().div_ceil(num_cpus).max(1);

        combinations
            .par_chunks(chunk_size)
            .map::<_, Result<_>>(|chunk| {
                let mut local_results = Vec::with_capacity(chunk.len());
                for params in chunk {
                    local_results.push((params.clone(), evaluate(self.series, params)?));
                }
                Ok(local_results)
            })
            .collect::<Result<Vec<_>>>()
            .map(|chunks| chunks.into_iter().flatten().collect())
    }
}

#[cfg(test)]
struct TargetDays;

#[cfg(test)]
impl ParameterGrid for TargetDays {
    type Output = u32;

    fn generate() -> Vec<Self::Output> {
        (1..=28).collect()
    }
}

#[cfg(test)]
#[test]
fn sweep_all_target_days() {
    use crate::engine::{ScheduledInvestor, flat_bar};

    let mut bars = Vec::new();
    for month in 1..=3u32 {
        for day in [4, 11, 18, 25] {
            bars.push(flat_bar(
                &format!("2024-{month:02}-{day:02}"),
                100.0 + month as f64 + day as f64 / 10.0,
            ));
        }
    }
    let series = PriceSeries::new(bars).unwrap();

    let sweep = Sweep::<TargetDays>::new(&series);
    let results = sweep
        .run(|series, day| {
            let result = ScheduledInvestor::new(1000.0, *day).run(series)?;
            Ok(result.map(|r| r.total_units()))
        })
        .unwrap();

    assert_eq!(results.len(), 28);
    // every target day buys once per month, whatever day it resolves to
    assert!(results.iter().all(|(_, units)| units.is_some()));
    // grid order is preserved
    assert_eq!(results[0].0, 1);
    assert_eq!(results[27].0, 28);
}
