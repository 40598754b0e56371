//! # Simple DCA vs Buy the Dip
//!
//! Runs both accumulation strategies over the same deterministic series,
//! prints the comparison table, exports the DCA purchase log and (with the
//! `draws` feature) renders the purchase points on a chart.
mod utils;

use std::error::Error;

use stacker_rs::loader;
use stacker_rs::prelude::*;

fn main() -> std::result::Result<(), Box<dyn Error>> {
    let series = utils::example_series();

    let params = ComparisonParams {
        monthly_budget: 10_000.0,
        day_of_month: 5,
        dip_threshold_pct: -5.0,
        min_purchase: 100.0,
    };
    let comparison = Comparison::run(&series, params)?;
    println!("{comparison}");

    if let Some(result) = comparison.scheduled() {
        loader::write_purchases_csv(result, "dca_purchases.csv")?;
        println!("wrote dca_purchases.csv ({} rows)", result.purchase_count());
    }

    if let Some(outcome) = comparison.dip() {
        println!(
            "dip engine: {} dip days, {} missed ({:.1}% purchase rate)",
            outcome.dip_days(),
            outcome.missed_opportunities(),
            outcome.purchase_rate_pct()
        );
    }

    #[cfg(feature = "draws")]
    {
        let options = DrawOptions::default()
            .title("Simple DCA vs Buy the Dip")
            .draw_output(DrawOutput::Svg("comparison.svg".to_owned()))
            .show_volume(true)
            .show_average_cost(true);

        let mut draw = Draw::with_series(&series).with_options(options);
        if let Some(result) = comparison.scheduled() {
            draw = draw.with_result("Simple DCA", result);
        }
        if let Some(outcome) = comparison.dip() {
            draw = draw.with_result("Buy the Dip", outcome.result());
        }
        draw.plot()?;
        println!("wrote comparison.svg");
    }

    Ok(())
}
