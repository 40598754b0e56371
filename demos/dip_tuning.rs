//! # Dip-threshold tuning
//!
//! How the buy-the-dip outcome shifts as the trigger gets stricter: a mild
//! threshold buys often at shallow discounts, a harsh one leaves the budget
//! sitting in cash.
mod utils;

use std::error::Error;

use stacker_rs::prelude::*;

fn main() -> std::result::Result<(), Box<dyn Error>> {
    let series = utils::example_series();

    println!(
        "{:>9} {:>9} {:>7} {:>11} {:>9} {:>12}",
        "threshold", "purchases", "missed", "avg cost", "return%", "utilization%"
    );

    for threshold in [-2.0, -3.0, -4.0, -5.0, -6.0, -8.0, -10.0] {
        let outcome = DipInvestor::new(10_000.0, threshold).run(&series)?;
        match outcome {
            Some(outcome) => println!(
                "{:>9.1} {:>9} {:>7} {:>11.2} {:>+9.2} {:>12.1}",
                threshold,
                outcome.purchase_count(),
                outcome.missed_opportunities(),
                outcome.average_cost(),
                outcome.return_pct(),
                outcome.capital_utilization_pct()
            ),
            None => println!("{threshold:>9.1} {:>9} {:>7} {:>11} {:>9} {:>12}", 0, 0, "n/a", "n/a", "n/a"),
        }
    }

    Ok(())
}
