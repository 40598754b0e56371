//! # Seasonal behavior of a price series
//!
//! Worst months by return and by intra-month drawdown, cross-year
//! seasonality per calendar month, and weekday return statistics.
mod utils;

use std::error::Error;

use stacker_rs::prelude::*;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn main() -> std::result::Result<(), Box<dyn Error>> {
    let series = utils::example_series();

    let mut breakdown = monthly_breakdown(&series);
    breakdown.sort_by(|a, b| a.return_pct().total_cmp(&b.return_pct()));

    println!("worst 5 months by return:");
    for month in breakdown.iter().take(5) {
        println!(
            "  {}  return {:>+7.2}%  drawdown {:>7.2}%  worst day {:>+6.2}%",
            month.month(),
            month.return_pct(),
            month.max_drawdown_pct(),
            month.max_daily_drop_pct()
        );
    }

    println!("\nseasonality per calendar month:");
    for stats in monthly_seasonality(&series) {
        println!(
            "  {}  win rate {:>5.1}%  mean {:>+6.2}%  median {:>+6.2}%  ({} years)",
            MONTH_NAMES[(stats.month() - 1) as usize],
            stats.win_rate_pct(),
            stats.mean_return_pct(),
            stats.median_return_pct(),
            stats.years()
        );
    }

    println!("\ndaily returns by weekday:");
    for stats in daily_stats(&series, Grouping::Weekday) {
        println!(
            "  weekday {}  mean {:>+6.3}%  vol {:>5.3}%  n={}",
            stats.key(),
            stats.mean_return_pct(),
            stats.volatility_pct().unwrap_or(0.0),
            stats.count()
        );
    }

    Ok(())
}
