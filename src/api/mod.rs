use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{LadderInput, LadderResult, YieldCurve, YieldPoint, calculate_ladder};

const API_MESSAGE: &str = "TIPS Ladder Calculator API";
const API_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_INFLATION_RATE: f64 = 0.03;
const DEFAULT_TAX_RATE: f64 = 0.2;

/// Request schema for `/calculate-ladder`.
///
/// `time_horizon`, `current_month`, `start_year` and `start_month` are
/// accepted for schema compatibility; the months are range-checked, but the
/// calculation itself never reads any of them.
#[derive(Debug, Deserialize)]
struct LadderPayload {
    current_age: u32,
    current_year: i32,
    #[allow(dead_code)]
    #[serde(default)]
    time_horizon: Option<u32>,
    #[serde(default)]
    current_month: Option<u32>,
    #[allow(dead_code)]
    #[serde(default)]
    start_year: Option<i32>,
    #[serde(default)]
    start_month: Option<u32>,
    target_income_stream: Vec<f64>,
    #[serde(default)]
    inflation_rate: Option<f64>,
    #[serde(default)]
    tax_rate: Option<f64>,
    tips_yields: Vec<YieldPoint>,
}

#[derive(Debug, Serialize)]
struct ApiInfo {
    message: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_ladder_input(payload: &LadderPayload) -> Result<LadderInput, String> {
    for (name, month) in [
        ("current_month", payload.current_month),
        ("start_month", payload.start_month),
    ] {
        if let Some(month) = month {
            if !(1..=12).contains(&month) {
                return Err(format!("{name} must be between 1 and 12"));
            }
        }
    }

    if payload
        .target_income_stream
        .iter()
        .any(|income| !income.is_finite())
    {
        return Err("target_income_stream values must be finite".to_string());
    }

    let inflation_rate = payload.inflation_rate.unwrap_or(DEFAULT_INFLATION_RATE);
    if !inflation_rate.is_finite() {
        return Err("inflation_rate must be finite".to_string());
    }

    let tax_rate = payload.tax_rate.unwrap_or(DEFAULT_TAX_RATE);
    if !tax_rate.is_finite() {
        return Err("tax_rate must be finite".to_string());
    }

    for point in &payload.tips_yields {
        if !point.maturity_years.is_finite() || point.maturity_years < 0.0 {
            return Err("tips_yields maturity_years must be finite and >= 0".to_string());
        }
        if !point.yield_rate.is_finite() {
            return Err("tips_yields yield_rate must be finite".to_string());
        }
    }

    let curve = YieldCurve::new(&payload.tips_yields).map_err(|e| e.to_string())?;

    Ok(LadderInput {
        current_age: payload.current_age,
        current_year: payload.current_year,
        inflation_rate,
        tax_rate,
        target_income_stream: payload.target_income_stream.clone(),
        curve,
    })
}

fn ladder_result_from_payload(payload: &LadderPayload) -> Result<LadderResult, String> {
    let input = build_ladder_input(payload)?;
    calculate_ladder(&input).map_err(|e| e.to_string())
}

/// Parse a `/calculate-ladder` request document and run the calculation.
/// Shared by the HTTP handler and the `calc` CLI subcommand so the two
/// surfaces cannot drift apart.
pub fn ladder_result_from_json(json: &str) -> Result<LadderResult, String> {
    let payload = serde_json::from_str::<LadderPayload>(json)
        .map_err(|e| format!("Invalid ladder JSON payload: {e}"))?;
    ladder_result_from_payload(&payload)
}

/// The 11-point illustrative curve served by `/sample-yields`. Static data
/// for client convenience, not computed.
fn sample_yields() -> Vec<YieldPoint> {
    [
        (0.5, 0.015),
        (1.5, 0.011),
        (2.5, 0.011),
        (3.5, 0.012),
        (4.5, 0.012),
        (5.5, 0.013),
        (6.5, 0.015),
        (7.5, 0.016),
        (8.5, 0.017),
        (9.5, 0.018),
        (10.5, 0.018),
    ]
    .into_iter()
    .map(|(maturity_years, yield_rate)| YieldPoint {
        maturity_years,
        yield_rate,
    })
    .collect()
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    log::info!("TIPS ladder API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route("/", get(api_info_handler))
        .route("/api", get(api_info_handler))
        .route("/calculate-ladder", post(calculate_ladder_handler))
        .route("/sample-yields", get(sample_yields_handler))
        .fallback(not_found_handler)
}

async fn api_info_handler() -> Response {
    json_response(
        StatusCode::OK,
        ApiInfo {
            message: API_MESSAGE,
            version: API_VERSION,
        },
    )
}

async fn calculate_ladder_handler(Json(payload): Json<LadderPayload>) -> Response {
    match ladder_result_from_payload(&payload) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(msg) => {
            log::warn!("rejected ladder request: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

async fn sample_yields_handler() -> Response {
    json_response(StatusCode::OK, sample_yields())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
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

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_payload_json() -> &'static str {
        r#"{
          "current_age": 65,
          "current_year": 2024,
          "time_horizon": 1,
          "current_month": 6,
          "start_year": 2024,
          "start_month": 7,
          "target_income_stream": [50000.0],
          "inflation_rate": 0.03,
          "tax_rate": 0.2,
          "tips_yields": [{"maturity_years": 0.5, "yield_rate": 0.015}]
        }"#
    }

    fn payload_from_json(json: &str) -> LadderPayload {
        serde_json::from_str(json).expect("payload should parse")
    }

    #[test]
    fn full_request_computes_the_pinned_scenario() {
        let result = ladder_result_from_json(sample_payload_json()).expect("valid request");

        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].real_interest_rate, 0.015);
        assert_approx(result.total_investment_required, 49_629.16669854651);
        assert_approx(result.total_real_income, 49_926.92141815191);
    }

    #[test]
    fn omitted_rates_fall_back_to_defaults() {
        let json = r#"{
          "current_age": 65,
          "current_year": 2024,
          "target_income_stream": [50000.0],
          "tips_yields": [{"maturity_years": 0.5, "yield_rate": 0.015}]
        }"#;
        let input = build_ladder_input(&payload_from_json(json)).expect("valid payload");

        assert_approx(input.inflation_rate, 0.03);
        assert_approx(input.tax_rate, 0.2);
    }

    #[test]
    fn pass_through_fields_are_optional() {
        let json = r#"{
          "current_age": 70,
          "current_year": 2026,
          "target_income_stream": [],
          "tips_yields": [{"maturity_years": 1.0, "yield_rate": 0.01}]
        }"#;
        let result = ladder_result_from_json(json).expect("valid request");

        assert!(result.steps.is_empty());
        assert_eq!(result.total_investment_required, 0.0);
    }

    #[test]
    fn out_of_range_month_is_rejected() {
        let mut payload = payload_from_json(sample_payload_json());
        payload.current_month = Some(13);

        let err = build_ladder_input(&payload).expect_err("must reject month 13");
        assert!(err.contains("current_month"));
    }

    #[test]
    fn empty_yield_set_is_rejected_with_a_message() {
        let mut payload = payload_from_json(sample_payload_json());
        payload.tips_yields.clear();

        let err = build_ladder_input(&payload).expect_err("must reject empty yields");
        assert!(err.contains("yield curve"));
    }

    #[test]
    fn negative_maturity_is_rejected() {
        let mut payload = payload_from_json(sample_payload_json());
        payload.tips_yields[0].maturity_years = -1.0;

        let err = build_ladder_input(&payload).expect_err("must reject negative maturity");
        assert!(err.contains("maturity_years"));
    }

    #[test]
    fn non_finite_income_is_rejected() {
        let mut payload = payload_from_json(sample_payload_json());
        payload.target_income_stream = vec![f64::NAN];

        let err = build_ladder_input(&payload).expect_err("must reject NaN income");
        assert!(err.contains("target_income_stream"));
    }

    #[test]
    fn sub_floor_inflation_surfaces_as_a_domain_error() {
        let mut payload = payload_from_json(sample_payload_json());
        payload.inflation_rate = Some(-1.0);

        let err = ladder_result_from_payload(&payload).expect_err("must reject -100% inflation");
        assert!(err.contains("-100%"));
    }

    #[test]
    fn result_serializes_every_step_and_summary_field() {
        let result = ladder_result_from_json(sample_payload_json()).expect("valid request");
        let json = serde_json::to_string(&result).expect("result should serialize");

        for field in [
            "\"steps\"",
            "\"age\"",
            "\"year\"",
            "\"target_income\"",
            "\"real_interest_rate\"",
            "\"years_out\"",
            "\"real_interest_inflator\"",
            "\"real_discount_rate\"",
            "\"ladder_amount_today\"",
            "\"inflation_inflator\"",
            "\"inflation_deflator\"",
            "\"nominal_interest_rate\"",
            "\"amount_in_play\"",
            "\"taxable_gain\"",
            "\"taxes\"",
            "\"nominal_income_pretax\"",
            "\"nominal_income_posttax\"",
            "\"real_posttax_income\"",
            "\"total_discount_factor\"",
            "\"total_discount_divisor\"",
            "\"nominal_income_discounted\"",
            "\"nominal_aftertax_discounted\"",
            "\"total_investment_required\"",
            "\"total_real_income\"",
            "\"post_tax_yield\"",
            "\"npv_taxes\"",
            "\"post_tax_real_gain\"",
        ] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
    }

    #[test]
    fn sample_yields_span_the_documented_curve() {
        let yields = sample_yields();

        assert_eq!(yields.len(), 11);
        assert_eq!(yields[0].maturity_years, 0.5);
        assert_eq!(yields[0].yield_rate, 0.015);
        assert_eq!(yields[10].maturity_years, 10.5);
        assert_eq!(yields[10].yield_rate, 0.018);
        for pair in yields.windows(2) {
            assert_approx(pair[1].maturity_years - pair[0].maturity_years, 1.0);
        }
    }

    #[test]
    fn malformed_json_reports_a_parse_error() {
        let err = ladder_result_from_json("{\"current_age\": }").expect_err("must reject");
        assert!(err.contains("Invalid ladder JSON payload"));
    }
}
