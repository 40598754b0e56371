use std::env;

use stacker_rs::loader;
use stacker_rs::prelude::*;

fn main() -> Result<()> {
    let path = env::args().nth(1).unwrap_or_else(|| "data/btc.csv".to_string());
    let series = loader::series_from_csv(&path)?;
    println!(
        "{} bars, {} to {}",
        series.len(),
        series.first().date(),
        series.last().date()
    );

    let comparison = Comparison::run(&series, ComparisonParams::default())?;
    println!("{comparison}");

    println!("Monthly seasonality (win rate / mean / median):");
    for stats in monthly_seasonality(&series) {
        println!(
            "  {:>2}: {:>5.1}% {:>+7.2}% {:>+7.2}%  ({} years)",
            stats.month(),
            stats.win_rate_pct(),
            stats.mean_return_pct(),
            stats.median_return_pct(),
            stats.years()
        );
    }

    Ok(())
}
