//! End-to-end simulation scenarios for both investor engines.

use super::*;

fn assert_close(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn scenario_scheduled_dca_three_months() {
    // 1000/month at closes 100, 120, 80
    let series = PriceSeries::new(vec![
        flat_bar("2024-01-05", 100.0),
        flat_bar("2024-02-05", 120.0),
        flat_bar("2024-03-05", 80.0),
    ])
    .unwrap();

    let result = ScheduledInvestor::new(1000.0, 5)
        .run(&series)
        .unwrap()
        .unwrap();

    assert_eq!(result.total_invested(), 3000.0);
    assert_eq!(result.total_should_save(), 3000.0);
    // 10 + 8.3333... + 12.5 units
    assert_close(result.total_units(), 30.833333333333332, 1e-12);
    assert_close(result.average_cost(), 97.2972972972973, 1e-10);
    assert_eq!(result.final_price(), 80.0);
    assert_close(result.holdings_value(), 2466.6666666666665, 1e-9);
    assert_close(result.return_pct(), -17.77777777777778, 1e-10);
    assert_eq!(result.total_value(), result.holdings_value());
}

#[test]
fn scenario_dip_engine_accrues_then_spends_everything() {
    // 3000/month accrues 100/day; one -6% dip on day 6, two quiet days after
    let mut bars = (2..=6)
        .map(|d| flat_bar(&format!("2024-01-{d:02}"), 100.0))
        .collect::<Vec<_>>();
    bars.push(ohlc_bar("2024-01-07", 100.0, 101.0, 93.0, 94.0));
    bars.push(flat_bar("2024-01-08", 96.0));
    bars.push(flat_bar("2024-01-09", 98.0));
    let series = PriceSeries::new(bars).unwrap();

    let outcome = DipInvestor::new(3000.0, -5.0)
        .run(&series)
        .unwrap()
        .unwrap();

    assert_eq!(outcome.dip_days(), 1);
    assert_eq!(outcome.purchase_count(), 1);
    assert_eq!(outcome.missed_opportunities(), 0);

    // six days of accrual went into the dip, two kept accruing afterwards
    assert_eq!(outcome.total_invested(), 600.0);
    assert_close(outcome.leftover_cash(), 200.0, 1e-9);
    assert_close(outcome.total_should_save(), 800.0, 1e-9);
    assert_close(outcome.capital_utilization_pct(), 75.0, 1e-9);

    let purchase = outcome.first_purchase();
    assert_eq!(purchase.date().to_string(), "2024-01-07");
    assert_eq!(purchase.price(), 94.0);

    // idle cash counts toward value but drags the return below buy-and-hold
    let expected_value = 600.0 / 94.0 * 98.0 + outcome.leftover_cash();
    assert_close(outcome.total_value(), expected_value, 1e-9);
}

#[test]
fn scenario_dip_without_dip_days_yields_no_result() {
    // a steady grind upward: nothing ever drops 5% intraday
    let bars = (2..=20)
        .map(|d| ohlc_bar(&format!("2024-01-{d:02}"), 100.0, 102.0, 99.0, 101.0))
        .collect::<Vec<_>>();
    let series = PriceSeries::new(bars).unwrap();

    let outcome = DipInvestor::new(3000.0, -5.0).run(&series).unwrap();
    assert!(outcome.is_none());
}

#[test]
fn scenario_dip_back_to_back_leaves_missed_opportunity() {
    // 2400/month accrues 80/day against the default 100 floor
    let series = PriceSeries::new(vec![
        flat_bar("2024-01-02", 100.0),
        ohlc_bar("2024-01-03", 100.0, 100.0, 92.0, 93.0),
        ohlc_bar("2024-01-04", 93.0, 93.0, 86.0, 87.0),
        flat_bar("2024-01-05", 90.0),
    ])
    .unwrap();

    let outcome = DipInvestor::new(2400.0, -5.0)
        .run(&series)
        .unwrap()
        .unwrap();

    // first dip spends the 160 balance; the second finds only 80 and is missed
    assert_eq!(outcome.dip_days(), 2);
    assert_eq!(outcome.purchase_count(), 1);
    assert_eq!(outcome.missed_opportunities(), 1);
    assert_eq!(outcome.total_invested(), 160.0);
    assert_eq!(outcome.purchase_rate_pct(), 50.0);

    // the missed dip did not reset the balance: two more days accrued
    assert_close(outcome.leftover_cash(), 160.0, 1e-9);
}

#[test]
fn scenario_runs_are_idempotent() {
    let mut bars = Vec::new();
    for month in 1..=6u32 {
        for day in [3, 9, 17, 25] {
            let base = 100.0 + month as f64 * 7.0 - day as f64;
            bars.push(ohlc_bar(
                &format!("2024-{month:02}-{day:02}"),
                base,
                base * 1.03,
                base * 0.93,
                if day == 17 { base * 0.94 } else { base * 1.01 },
            ));
        }
    }
    let series = PriceSeries::new(bars).unwrap();

    let dca = ScheduledInvestor::new(1000.0, 10);
    let first = dca.run(&series).unwrap().unwrap();
    let second = dca.run(&series).unwrap().unwrap();
    assert_eq!(first, second);

    let dip = DipInvestor::new(1000.0, -5.0);
    let first = dip.run(&series).unwrap().unwrap();
    let second = dip.run(&series).unwrap().unwrap();
    assert_eq!(first, second);
}

#[test]
fn scenario_conservation_holds_over_a_noisy_run() {
    let mut bars = Vec::new();
    for month in 1..=12u32 {
        for day in 1..=28u32 {
            let base = 120.0 + (month as f64 * 3.7 + day as f64 * 1.3).sin() * 30.0;
            let close = if day % 11 == 0 { base * 0.93 } else { base * 1.002 };
            bars.push(ohlc_bar(
                &format!("2023-{month:02}-{day:02}"),
                base,
                base.max(close) * 1.01,
                base.min(close) * 0.99,
                close,
            ));
        }
    }
    let series = PriceSeries::new(bars).unwrap();

    let outcome = DipInvestor::new(3000.0, -5.0)
        .run(&series)
        .unwrap()
        .unwrap();
    assert!(outcome.purchase_count() > 1);

    let spent = outcome.purchases().map(Purchase::cash_spent).sum::<f64>();
    let units = outcome.purchases().map(Purchase::units).sum::<f64>();
    assert_eq!(spent, outcome.total_invested());
    assert_eq!(units, outcome.total_units());

    let mut previous_cash = 0.0;
    let mut previous_units = 0.0;
    for purchase in outcome.purchases() {
        assert!(purchase.total_cash_spent() >= previous_cash);
        assert!(purchase.total_units() >= previous_units);
        previous_cash = purchase.total_cash_spent();
        previous_units = purchase.total_units();
    }
}
