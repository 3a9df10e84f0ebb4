//! liquidation-engine CLI
//!
//! Plan asset liquidations from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Plan a liquidation for a request file
//! liquidation-engine optimize --input request.json --prices prices.json
//!
//! # Rank ties and suggest switches from asset metrics, output as JSON
//! liquidation-engine optimize --input request.json --prices prices.json \
//!     --metrics metrics.json --format json
//!
//! # Generate a random request (with prices and metrics) for experimentation
//! liquidation-engine generate --members 3 --holdings 4 --output request.json
//! ```
//!
//! Policy constants can be overridden with `LIQUIDATION_*` environment
//! variables; logging is controlled with `RUST_LOG`.

use liquidation_engine::config::EngineConfig;
use liquidation_engine::core::metrics::MetricsTable;
use liquidation_engine::core::pricing::PriceTable;
use liquidation_engine::engine::{LiquidationEngine, LiquidationRequest};
use liquidation_engine::simulation::scenario::{generate_random_scenario, ScenarioConfig};
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"liquidation-engine: questionnaire-driven asset liquidation planner

USAGE:
    liquidation-engine <COMMAND> [OPTIONS]

COMMANDS:
    optimize    Plan how to raise the requested amount from a portfolio
    generate    Generate a random request and price table (for testing)
    help        Show this message

OPTIONS (optimize):
    --input <FILE>      Path to JSON request ({{"portfolio": ..., "questionnaire": ...}})
    --prices <FILE>     Path to JSON stock prices ({{"TCS": 3500.5, ...}})
    --metrics <FILE>    Path to JSON asset metrics ({{"stocks": ..., "mutual_funds": ...}})
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --members <N>       Number of household members (default: 3)
    --holdings <N>      Funds and stocks per member (default: 4)
    --output <FILE>     Write the request to FILE, prices to FILE.prices.json
                        and metrics to FILE.metrics.json

ENVIRONMENT:
    RUST_LOG                              Log filter (e.g. liquidation_engine=debug)
    LIQUIDATION_RECURRING_MAX_FRACTION    Share of a holding drawn for recurring needs
    LIQUIDATION_URGENCY_OVERRIDE_TIER     Urgency at which liquidity beats goal preservation
    LIQUIDATION_RESERVE_<PURPOSE>         Suggested bank share after liquidation (e.g. _OTHER)
    LIQUIDATION_POOR_STOCK_SCORE          Sell score above which a stock is flagged for switching
    LIQUIDATION_POOR_FUND_SCORE           Sell score above which a fund is flagged for switching

EXAMPLES:
    liquidation-engine optimize --input request.json
    liquidation-engine optimize --input request.json --prices prices.json --format json
    liquidation-engine optimize --input request.json --prices prices.json --metrics metrics.json
    liquidation-engine generate --members 5 --holdings 6 --output scenario.json"#
    );
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    })
}

fn load_prices(path: Option<&str>) -> PriceTable {
    let Some(path) = path else {
        return PriceTable::new();
    };
    PriceTable::from_json(&read_file(path)).unwrap_or_else(|e| {
        eprintln!("Error loading prices from '{}': {}", path, e);
        eprintln!(r#"Expected format: {{ "RELIANCE": 2450.75, "TCS": "3500.50" }}"#);
        process::exit(1);
    })
}

fn load_metrics(path: Option<&str>) -> MetricsTable {
    let Some(path) = path else {
        return MetricsTable::new();
    };
    MetricsTable::from_json(&read_file(path)).unwrap_or_else(|e| {
        eprintln!("Error loading metrics from '{}': {}", path, e);
        eprintln!(r#"Expected format: {{ "stocks": {{ "TCS": {{ "pe_ratio": 32 }} }}, "mutual_funds": {{}} }}"#);
        process::exit(1);
    })
}

fn option_value(args: &[String], i: usize, flag: &str, hint: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("{} requires {}", flag, hint);
        process::exit(1);
    })
}

fn cmd_optimize(args: &[String]) {
    let mut input_path = None;
    let mut prices_path = None;
    let mut metrics_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(option_value(args, i, "--input", "a file path"));
            }
            "--prices" => {
                i += 1;
                prices_path = Some(option_value(args, i, "--prices", "a file path"));
            }
            "--metrics" => {
                i += 1;
                metrics_path = Some(option_value(args, i, "--metrics", "a file path"));
            }
            "--format" => {
                i += 1;
                format = option_value(args, i, "--format", "'text' or 'json'");
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let engine = EngineConfig::from_env()
        .and_then(LiquidationEngine::new)
        .unwrap_or_else(|e| {
            eprintln!("Invalid configuration: {}", e);
            process::exit(1);
        });
    let prices = load_prices(prices_path.as_deref());
    let metrics = load_metrics(metrics_path.as_deref());

    let request: LiquidationRequest = serde_json::from_str(&read_file(&path)).unwrap_or_else(|e| {
        eprintln!("Invalid request: {}", e);
        process::exit(1);
    });
    let response = engine
        .process_with(&request, &prices, &metrics)
        .unwrap_or_else(|e| {
            eprintln!("Invalid request: {}", e);
            process::exit(1);
        });

    if format == "json" {
        println!("{}", to_pretty_json(&response));
    } else {
        println!("{}", response);
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = ScenarioConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--members" => {
                i += 1;
                config.member_count = option_value(args, i, "--members", "a number")
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("--members requires a number");
                        process::exit(1);
                    });
            }
            "--holdings" => {
                i += 1;
                config.holdings_per_member = option_value(args, i, "--holdings", "a number")
                    .parse()
                    .unwrap_or_else(|_| {
                        eprintln!("--holdings requires a number");
                        process::exit(1);
                    });
            }
            "--output" => {
                i += 1;
                output_path = Some(option_value(args, i, "--output", "a file path"));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let scenario = generate_random_scenario(&config);
    let request_json = to_pretty_json(&scenario.request);
    let prices_json = to_pretty_json(&scenario.prices);
    let metrics_json = to_pretty_json(&scenario.metrics);

    if let Some(path) = output_path {
        let stem = path.trim_end_matches(".json");
        let prices_path = format!("{}.prices.json", stem);
        let metrics_path = format!("{}.metrics.json", stem);
        for (target, body) in [
            (&path, &request_json),
            (&prices_path, &prices_json),
            (&metrics_path, &metrics_json),
        ] {
            fs::write(target, body).unwrap_or_else(|e| {
                eprintln!("Error writing to '{}': {}", target, e);
                process::exit(1);
            });
        }
        eprintln!(
            "Generated request for {} members -> {} (prices -> {}, metrics -> {})",
            config.member_count, path, prices_path, metrics_path
        );
    } else {
        println!("{}", request_json);
        eprintln!("Prices:\n{}", prices_json);
        eprintln!("Metrics:\n{}", metrics_json);
    }
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error encoding JSON: {}", e);
        process::exit(1);
    })
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "optimize" => cmd_optimize(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
