// In app/src/report.rs

use analytics::{Classification, EnrichedRecord, SummaryTotals};
use rust_decimal::Decimal;

fn opt(value: Option<Decimal>, dp: u32) -> String {
    value.map(|v| v.round_dp(dp).to_string()).unwrap_or_else(|| "-".to_string())
}

fn ratio(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// Prints one line per journal record.
pub fn print_records(records: &[EnrichedRecord]) {
    println!(
        "\n{:<12} {:<10} {:<6} {:<10} {:<5} {:>10} {:>10} {:>8} {:>8} {:>9} {:>10} {:>7} {:>7}  {}",
        "Ticket", "Position", "Action", "Symbol", "Side", "Entry", "Close", "SL pips", "TP pips", "Res pips", "Result", "RR plan", "RR fact", "Class"
    );
    for r in records {
        println!(
            "{:<12} {:<10} {:<6} {:<10} {:<5} {:>10} {:>10} {:>8} {:>8} {:>9} {:>10} {:>7} {:>7}  {:?}",
            r.leg.ticket,
            r.leg.position_id,
            r.leg.kind.action(),
            r.leg.symbol,
            r.leg.side,
            opt(r.entry_price, 5),
            opt(r.close_price, 5),
            opt(r.stop_loss_distance_pips, 1),
            opt(r.take_profit_distance_pips, 1),
            opt(r.result_distance_pips, 1),
            r.result_money.round_dp(2),
            ratio(r.planned_reward_ratio),
            ratio(r.realized_reward_ratio),
            r.classification,
        );
    }
}

/// Prints the win/lose/breakeven roll-up.
pub fn print_summary(totals: &SummaryTotals) {
    println!("\n--- Journal Summary ---");
    for (label, class) in [
        ("Win", Classification::Win),
        ("Lose", Classification::Lose),
        ("Breakeven", Classification::Breakeven),
    ] {
        println!(
            "  {:<10} {:>5} ({:>6.2}%)  {:>12}",
            label,
            totals.count(class),
            totals.percentage(class),
            totals.result(class).round_dp(2)
        );
    }
    println!("  {:<10} {:>5}            {:>12}", "Total", totals.total_count, totals.total_result.round_dp(2));
    match totals.profit_factor() {
        Some(pf) => println!("  Profit factor: {pf:.2} | Average result: {}", totals.average_result().round_dp(2)),
        None => println!("  Profit factor: N/A | Average result: {}", totals.average_result().round_dp(2)),
    }
    println!("-----------------------");
}
