//! Basic liquidation planning example.
//!
//! Shows how the engine orders holdings by liquidity and how recurring
//! needs leave a buffer in every holding drawn from.

use liquidation_engine::prelude::*;
use rust_decimal_macros::dec;

fn main() {
    println!("╔════════════════════════════════════════════════╗");
    println!("║  liquidation-engine: Basic Liquidation Example ║");
    println!("╚════════════════════════════════════════════════╝\n");

    let engine = LiquidationEngine::default();
    let prices = PriceTable::new();

    let portfolio = PortfolioInput::new()
        .with_bank_balance("self", dec!(40_000))
        .with_mutual_fund("self", "HDFC_FLEXICAP", dec!(120_000))
        .with_mutual_fund("self", "SBI_SMALLCAP", dec!(60_000));

    // --- Scenario 1: One-time need ---
    println!("━━━ Scenario 1: One-time purchase ━━━\n");

    let request = LiquidationRequest::new(
        portfolio.clone(),
        QuestionnaireInput::from(
            &Questionnaire::new(dec!(100_000))
                .with_purpose(Purpose::PlannedPurchase)
                .with_timeline(Timeline::OneToFourWeeks),
        ),
    );
    match engine.process(&request, &prices) {
        Ok(response) => println!("{}", response),
        Err(e) => eprintln!("Invalid request: {}", e),
    }

    // --- Scenario 2: Same amount, recurring ---
    println!("━━━ Scenario 2: Recurring need (buffer kept) ━━━\n");

    let request = LiquidationRequest::new(
        portfolio,
        QuestionnaireInput::from(
            &Questionnaire::new(dec!(100_000)).with_recurring_need(RecurringNeed::Recurring),
        ),
    );
    match engine.plan(&request, &prices) {
        Ok(plan) => {
            for line in plan.lines() {
                println!(
                    "  {:<15} {:>12}  ({:.0}% of holding)",
                    line.asset_key,
                    line.amount,
                    line.fraction_of_holding() * dec!(100)
                );
            }
            println!("\n  Raised:    {}", plan.total_raised());
            println!("  Shortfall: {}", plan.shortfall());
        }
        Err(e) => eprintln!("Invalid request: {}", e),
    }
}
