use chrono::{Duration, NaiveDate};
use stacker_rs::engine::{BarBuilder, PriceBar, PriceSeries};

/// Generates deterministic daily bars.
///
/// A slow uptrend with trigonometric wobble, plus a hard intraday flush every
/// 29th bar so the dip engine has something to buy.
pub fn generate_sample_bars(days: i64, seed: i64, base_price: f64) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid start date");
    let mut open = base_price;

    (0..days)
        .map(|i| {
            // Base price with trend (+ 0.05/day)
            let trend = base_price + 0.05 * (i as f64);

            // Price variation using simple trigonometric function with seed
            let variation = 6.0 * ((i as f64 * 0.31 + seed as f64).sin() * 0.5 + 0.5);

            let mut close = trend + variation;
            if i % 29 == 28 {
                // capitulation day
                close = open * 0.93;
            }
            let high = open.max(close) * 1.01;
            let low = open.min(close) * 0.99;
            // Volume with seasonal pattern
            let volume = 1000.0 + 500.0 * ((i as f64 * 0.2).sin()).abs();

            let bar = BarBuilder::builder()
                .date(start + Duration::days(i))
                .open(open)
                .high(high)
                .low(low)
                .close(close)
                .volume(volume)
                .build()
                .expect("generated prices are positive");

            open = close;
            bar
        })
        .collect()
}

/// Three years of deterministic daily data.
pub fn example_series() -> PriceSeries {
    PriceSeries::new(generate_sample_bars(1095, 42, 100.0)).expect("valid sample data")
}
