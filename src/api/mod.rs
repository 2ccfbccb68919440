use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    Debt, PaymentAdjustment, PayoffPlanEntry, PayoffStrategy, PlanError, PlanOutcome,
    PlanRequest, PlanTotals, PriorityMap, generate_plan,
};
use crate::report::{Currency, render_outcome};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliStrategy {
    Avalanche,
    Snowball,
    Custom,
}

impl From<CliStrategy> for PayoffStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Avalanche => PayoffStrategy::Avalanche,
            CliStrategy::Snowball => PayoffStrategy::Snowball,
            CliStrategy::Custom => PayoffStrategy::Custom,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStrategy {
    #[serde(alias = "debt-avalanche", alias = "debtAvalanche")]
    Avalanche,
    #[serde(alias = "debt-snowball", alias = "debtSnowball")]
    Snowball,
    #[serde(alias = "custom-priority", alias = "customPriority")]
    Custom,
}

impl From<ApiStrategy> for PayoffStrategy {
    fn from(value: ApiStrategy) -> Self {
        match value {
            ApiStrategy::Avalanche => PayoffStrategy::Avalanche,
            ApiStrategy::Snowball => PayoffStrategy::Snowball,
            ApiStrategy::Custom => PayoffStrategy::Custom,
        }
    }
}

impl From<PayoffStrategy> for ApiStrategy {
    fn from(value: PayoffStrategy) -> Self {
        match value {
            PayoffStrategy::Avalanche => ApiStrategy::Avalanche,
            PayoffStrategy::Snowball => ApiStrategy::Snowball,
            PayoffStrategy::Custom => ApiStrategy::Custom,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "payoff",
    about = "Debt payoff planner (avalanche, snowball or custom priority)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate a payoff plan for debts read from a JSON file
    Plan(PlanArgs),
    /// Serve the JSON planning API
    Serve {
        #[arg(long, env = "PAYOFF_PORT", default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[arg(long, help = "JSON array of debt records: id, name, balance, apr")]
    pub debts: PathBuf,
    #[arg(long, help = "Monthly payment shared across all debts")]
    pub payment: f64,
    #[arg(long, value_enum, default_value_t = CliStrategy::Avalanche)]
    pub strategy: CliStrategy,
    #[arg(long, help = "Target payoff date, YYYY-MM-DD")]
    pub target_date: Option<String>,
    #[arg(
        long = "priority",
        value_name = "NAME=RANK",
        help = "Debt priority; lower ranks are paid first. Only ranked debts are planned"
    )]
    pub priorities: Vec<String>,
    #[arg(long, default_value = "GBP", help = "Currency for amounts: GBP, USD or EUR")]
    pub currency: Currency,
    #[arg(long, help = "Print the plan as JSON instead of a table")]
    pub json: bool,
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    debts: Vec<Debt>,
    monthly_payment: Option<f64>,
    strategy: Option<ApiStrategy>,
    target_date: Option<String>,
    priorities: HashMap<String, i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlannedResponse {
    strategy: ApiStrategy,
    payment_used: f64,
    payment_increased: bool,
    adjustment: Option<PaymentAdjustment>,
    paid_off: bool,
    months_simulated: u32,
    reached_month_cap: bool,
    entries: Vec<PayoffPlanEntry>,
    totals: PlanTotals,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
enum PlanResponse {
    Planned(PlannedResponse),
    NoDebts,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn run_plan_command(args: PlanArgs, today: NaiveDate) -> Result<String, CommandError> {
    let raw = std::fs::read_to_string(&args.debts).map_err(|source| CommandError::Io {
        path: args.debts.clone(),
        source,
    })?;
    let debts: Vec<Debt> = serde_json::from_str(&raw)?;

    let request = PlanRequest {
        debts,
        monthly_payment: args.payment,
        strategy: args.strategy.into(),
        target_date: parse_target_date(args.target_date.as_deref())?,
        priorities: parse_priorities(&args.priorities)?,
    };
    let outcome = generate_plan(&request, today)?;

    if args.json {
        let mut json = serde_json::to_string_pretty(&build_plan_response(&outcome))?;
        json.push('\n');
        Ok(json)
    } else {
        Ok(render_outcome(&outcome, args.currency))
    }
}

fn parse_target_date(raw: Option<&str>) -> Result<Option<NaiveDate>, PlanError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| PlanError::invalid("target_date", format!("'{text}' is not YYYY-MM-DD"))),
    }
}

fn parse_priorities(raw: &[String]) -> Result<PriorityMap, PlanError> {
    let mut priorities = PriorityMap::with_capacity(raw.len());
    for item in raw {
        let Some((name, rank)) = item.rsplit_once('=') else {
            return Err(PlanError::invalid(
                "priority",
                format!("'{item}' must look like NAME=RANK"),
            ));
        };
        let rank = rank.trim().parse::<i64>().map_err(|_| {
            PlanError::invalid("priority", format!("rank in '{item}' must be an integer"))
        })?;
        priorities.insert(name.trim().to_string(), rank);
    }
    Ok(priorities)
}

fn plan_request_from_payload(payload: PlanPayload) -> Result<PlanRequest, PlanError> {
    let Some(monthly_payment) = payload.monthly_payment else {
        return Err(PlanError::invalid("monthly_payment", "is required"));
    };

    Ok(PlanRequest {
        debts: payload.debts,
        monthly_payment,
        strategy: payload.strategy.map(PayoffStrategy::from).unwrap_or_default(),
        target_date: parse_target_date(payload.target_date.as_deref())?,
        priorities: payload.priorities,
    })
}

#[cfg(test)]
fn plan_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_request_from_payload(payload).map_err(|e| e.to_string())
}

fn build_plan_response(outcome: &PlanOutcome) -> PlanResponse {
    match outcome {
        PlanOutcome::NoDebts => PlanResponse::NoDebts,
        PlanOutcome::Planned(plan) => PlanResponse::Planned(PlannedResponse {
            strategy: plan.strategy.into(),
            payment_used: plan.payment_used,
            payment_increased: plan.adjustment.is_some(),
            adjustment: plan.adjustment,
            paid_off: plan.is_paid_off(),
            months_simulated: plan.months_simulated,
            reached_month_cap: plan.reached_month_cap,
            entries: plan.entries.clone(),
            totals: plan.totals,
        }),
    }
}

pub fn app_router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/plan", post(plan_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("payoff HTTP API listening on http://{addr}");

    axum::serve(listener, app_router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_handler(payload: Result<Json<PlanPayload>, JsonRejection>) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid API JSON payload: {}", rejection.body_text()),
            );
        }
    };

    let today = chrono::Local::now().date_naive();
    match plan_request_from_payload(payload).and_then(|request| generate_plan(&request, today)) {
        Ok(outcome) => json_response(StatusCode::OK, build_plan_response(&outcome)),
        Err(err) => {
            let status = if err.is_invalid_input() {
                StatusCode::BAD_REQUEST
            } else {
                tracing::error!(error = %err, "payoff plan computation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            };
            error_response(status, &err.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")
    }

    fn write_debts_file(name: &str, json: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("payoff-{}-{name}.json", std::process::id()));
        fs::write(&path, json).expect("failed to write debts file");
        path
    }

    fn sample_args(debts: PathBuf) -> PlanArgs {
        PlanArgs {
            debts,
            payment: 300.0,
            strategy: CliStrategy::Snowball,
            target_date: None,
            priorities: Vec::new(),
            currency: Currency::Usd,
            json: false,
        }
    }

    #[test]
    fn plan_request_from_json_parses_web_keys() {
        let json = r#"{
          "debts": [
            {"id": 1, "name": "Card", "balance": 1200, "apr": 19.99},
            {"id": 2, "name": "Car", "balance": 8000, "apr": 6.5, "originalBalance": 12000}
          ],
          "monthlyPayment": 450,
          "strategy": "custom-priority",
          "targetDate": "2027-03-01",
          "priorities": {"Car": 1}
        }"#;
        let request = plan_request_from_json(json).expect("json should parse");

        assert_eq!(request.debts.len(), 2);
        assert_eq!(request.debts[1].original_balance, Some(12_000.0));
        assert_approx(request.monthly_payment, 450.0);
        assert_eq!(request.strategy, PayoffStrategy::Custom);
        assert_eq!(request.target_date, NaiveDate::from_ymd_opt(2027, 3, 1));
        assert_eq!(request.priorities.get("Car"), Some(&1));
    }

    #[test]
    fn plan_request_defaults_to_avalanche_without_priorities() {
        let request =
            plan_request_from_json(r#"{"monthlyPayment": 100}"#).expect("json should parse");
        assert_eq!(request.strategy, PayoffStrategy::Avalanche);
        assert!(request.priorities.is_empty());
        assert!(request.target_date.is_none());
    }

    #[test]
    fn plan_request_requires_monthly_payment() {
        let err = plan_request_from_json(r#"{"debts": []}"#).expect_err("must reject");
        assert!(err.contains("monthly_payment"));
    }

    #[test]
    fn plan_request_rejects_malformed_target_date() {
        let err = plan_request_from_json(r#"{"monthlyPayment": 100, "targetDate": "03/01/2027"}"#)
            .expect_err("must reject");
        assert!(err.contains("target_date"));
    }

    #[test]
    fn plan_request_rejects_unknown_strategy() {
        let err = plan_request_from_json(r#"{"monthlyPayment": 100, "strategy": "lottery"}"#)
            .expect_err("must reject");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn priorities_parse_name_equals_rank() {
        let parsed = parse_priorities(&["Car loan=2".to_string(), "Visa = 1".to_string()])
            .expect("valid priorities");
        assert_eq!(parsed.get("Car loan"), Some(&2));
        assert_eq!(parsed.get("Visa"), Some(&1));

        let err = parse_priorities(&["Visa".to_string()]).expect_err("must reject");
        assert!(err.to_string().contains("NAME=RANK"));
        let err = parse_priorities(&["Visa=first".to_string()]).expect_err("must reject");
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn cli_parses_plan_flags() {
        let cli = Cli::try_parse_from([
            "payoff",
            "plan",
            "--debts",
            "debts.json",
            "--payment",
            "250",
            "--strategy",
            "custom",
            "--priority",
            "Visa=1",
            "--currency",
            "eur",
        ])
        .expect("valid command line");

        let Command::Plan(args) = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(args.strategy, CliStrategy::Custom);
        assert_eq!(args.currency, Currency::Eur);
        assert_eq!(args.priorities, ["Visa=1"]);
        assert_approx(args.payment, 250.0);
        assert!(!args.json);
    }

    #[test]
    fn plan_response_serialization_contains_expected_fields() {
        let request = plan_request_from_json(
            r#"{"debts": [{"id": 1, "name": "Card", "balance": 1200, "apr": 12}],
                "monthlyPayment": 200}"#,
        )
        .expect("json should parse");
        let outcome = generate_plan(&request, today()).expect("valid plan");
        let json = serde_json::to_string(&build_plan_response(&outcome))
            .expect("response should serialize");

        assert!(json.contains("\"status\":\"planned\""));
        assert!(json.contains("\"strategy\":\"avalanche\""));
        assert!(json.contains("\"paymentUsed\":200.0"));
        assert!(json.contains("\"paidOff\":true"));
        assert!(json.contains("\"entries\""));
        assert!(json.contains("\"totals\""));
        assert!(json.contains("\"finalBalance\""));
        assert!(json.contains("\"id\":1"));
    }

    #[test]
    fn no_debts_response_is_a_bare_status() {
        let json = serde_json::to_string(&build_plan_response(&PlanOutcome::NoDebts))
            .expect("response should serialize");
        assert_eq!(json, r#"{"status":"no-debts"}"#);
    }

    #[test]
    fn plan_command_renders_table_in_requested_currency() {
        let path = write_debts_file(
            "table",
            r#"[{"id": 1, "name": "Card", "balance": 1200, "apr": 12},
                {"id": 2, "name": "Store", "balance": 300, "apr": 24}]"#,
        );
        let output = run_plan_command(sample_args(path.clone()), today()).expect("plan runs");
        fs::remove_file(&path).ok();

        assert!(output.starts_with("Debt Snowball with $300.00 per month"));
        let store_row = output
            .lines()
            .position(|l| l.starts_with("Store"))
            .expect("store row");
        let card_row = output
            .lines()
            .position(|l| l.starts_with("Card"))
            .expect("card row");
        assert!(store_row < card_row);
        assert!(output.lines().any(|l| l.starts_with("Total")));
    }

    #[test]
    fn plan_command_reports_no_debts() {
        let path = write_debts_file("empty", "[]");
        let output = run_plan_command(sample_args(path.clone()), today()).expect("plan runs");
        fs::remove_file(&path).ok();
        assert_eq!(output.trim_end(), crate::report::NO_DEBTS_MESSAGE);
    }

    #[test]
    fn plan_command_surfaces_validation_errors() {
        let path = write_debts_file("invalid", r#"[{"id": 1, "name": "Card", "balance": 100, "apr": 5}]"#);
        let mut args = sample_args(path.clone());
        args.payment = 0.0;
        let err = run_plan_command(args, today()).expect_err("must reject");
        fs::remove_file(&path).ok();
        assert!(matches!(err, CommandError::Plan(ref e) if e.is_invalid_input()));
    }

    #[test]
    fn plan_command_reports_missing_file() {
        let args = sample_args(PathBuf::from("/nonexistent/payoff-debts.json"));
        let err = run_plan_command(args, today()).expect_err("must fail");
        assert!(err.to_string().contains("payoff-debts.json"));
    }
}
