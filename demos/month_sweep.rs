//! # Target-day sweep
//!
//! Does the day of the month you DCA on matter? Sweeps every target day in
//! parallel and ranks them by units accumulated.
//!
//! Run with `--features optimizer`.
mod utils;

use std::error::Error;

use stacker_rs::prelude::*;

struct TargetDays;

impl ParameterGrid for TargetDays {
    type Output = u32;

    fn generate() -> Vec<Self::Output> {
        (1..=31).collect()
    }
}

fn main() -> std::result::Result<(), Box<dyn Error>> {
    let series = utils::example_series();

    let sweep = Sweep::<TargetDays>::new(&series);
    let mut results = sweep.run(|series, day| {
        let result = ScheduledInvestor::new(10_000.0, *day).run(series)?;
        Ok(result.map(|r| (r.total_units(), r.return_pct())))
    })?;

    results.sort_by(|a, b| {
        let units_a = a.1.map(|(units, _)| units).unwrap_or(f64::MIN);
        let units_b = b.1.map(|(units, _)| units).unwrap_or(f64::MIN);
        units_b.total_cmp(&units_a)
    });

    println!("target day ranked by accumulated units:");
    for (day, outcome) in results {
        match outcome {
            Some((units, return_pct)) => {
                println!("  day {day:>2}: {units:>12.6} units ({return_pct:>+6.2}%)")
            }
            None => println!("  day {day:>2}: no purchases"),
        }
    }

    Ok(())
}
