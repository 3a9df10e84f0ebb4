//! Household emergency example.
//!
//! A medical emergency hits a three-member household. One member is put
//! first, some funds back long-term goals, and stocks are valued from a
//! price table. Because the need is urgent, goal-linked funds lose their
//! protection and are drawn in plain liquidity order. Fund and stock metrics
//! decide which of two equally liquid funds goes first and flag weak
//! holdings worth switching out of.

use liquidation_engine::prelude::*;
use rust_decimal_macros::dec;

const REQUEST: &str = r#"{
    "portfolio": {
        "bank_balances": {"ravi": 25000, "meera": 60000, "dad": 10000},
        "mutual_funds": {
            "ravi":  {"HDFC_DEBT": 150000, "MIRAE_LARGECAP": 80000},
            "meera": {"PARAG_PARIKH_FLEXI": 200000},
            "dad":   {"ICICI_BALANCED": 90000}
        },
        "stocks": {
            "ravi":  {"TCS": 15, "ITC": 200},
            "meera": {"INFY": 40}
        },
        "goal_linked": {"ravi": ["HDFC_DEBT"], "meera": ["PARAG_PARIKH_FLEXI"]}
    },
    "questionnaire": {
        "purpose": "emergency",
        "timeline": "within_week",
        "amount_needed": 300000,
        "recurring_need": "one_time",
        "has_goals": "yes",
        "income_change": "will_reduce",
        "priority_members": ["dad"]
    }
}"#;

fn main() {
    println!("╔═════════════════════════════════════════════════╗");
    println!("║  liquidation-engine: Family Emergency Example   ║");
    println!("╚═════════════════════════════════════════════════╝\n");

    let prices = PriceTable::new()
        .with_price("TCS", dec!(3520.40))
        .and_then(|t| t.with_price("ITC", dec!(431.15)))
        .and_then(|t| t.with_price("INFY", dec!(1488.90)));
    let prices = match prices {
        Ok(prices) => prices,
        Err(e) => {
            eprintln!("Invalid price table: {}", e);
            return;
        }
    };

    let request: LiquidationRequest = match serde_json::from_str(REQUEST) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Invalid request: {}", e);
            return;
        }
    };

    let metrics = MetricsTable::new()
        .with_fund(
            "MIRAE_LARGECAP",
            FundMetrics {
                cagr_3y: 8.2,
                expense_ratio: 2.3,
                ..Default::default()
            },
        )
        .with_fund(
            "ICICI_BALANCED",
            FundMetrics {
                risk_category: RiskCategory::ModeratelyLow,
                ..Default::default()
            },
        )
        .with_stock(
            "ITC",
            StockMetrics {
                promoter_holding: 0.0,
                five_year_cagr: 6.5,
                months_held: 30,
                ..Default::default()
            },
        );

    let engine = LiquidationEngine::default();
    let eval = match engine.evaluate_with(&request, &prices, &metrics) {
        Ok(eval) => eval,
        Err(e) => {
            eprintln!("Invalid request: {}", e);
            return;
        }
    };

    println!("━━━ Urgency ━━━\n");
    println!("  Tier:            {}", eval.profile.urgency_tier());
    println!("  Urgent:          {}", eval.profile.is_urgent());
    println!("  Preserve goals:  {}", eval.profile.preserves_goals());
    println!();

    println!("━━━ Candidate Order ━━━\n");
    for (i, candidate) in LiquidationOptimizer::ranked_candidates(&eval.portfolio, &eval.profile, &metrics)
        .iter()
        .enumerate()
    {
        let score = candidate
            .assessment
            .as_ref()
            .map_or("-".to_string(), |a| a.score.to_string());
        println!(
            "  {:>2}. {:<40} ~{} days to cash, sell score {}",
            i + 1,
            candidate.holding.to_string(),
            candidate.holding.estimated_days_to_cash(),
            score
        );
    }
    println!();

    println!(
        "{}",
        LiquidationResponse::from_plan(
            &eval.plan,
            &eval.portfolio,
            &eval.profile,
            engine.config(),
            &metrics
        )
    );
}
