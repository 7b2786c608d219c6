use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::curve::YieldCurve;

/// One observed point on the TIPS yield curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldPoint {
    pub maturity_years: f64,
    pub yield_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LadderError {
    #[error("yield curve has no points; at least one maturity is required")]
    EmptyYieldCurve,
    #[error("rate {rate} at {years_out} years out is at or below -100% and cannot be compounded")]
    RateBelowFloor { rate: f64, years_out: f64 },
}

#[derive(Debug, Clone)]
pub struct LadderInput {
    pub current_age: u32,
    pub current_year: i32,
    pub inflation_rate: f64,
    pub tax_rate: f64,
    pub target_income_stream: Vec<f64>,
    pub curve: YieldCurve,
}

/// One rung of the ladder: the bond bought today to fund a single future
/// year's income, with every intermediate figure kept as its own field.
#[derive(Debug, Clone, Serialize)]
pub struct LadderStep {
    pub age: u32,
    pub year: i32,
    pub target_income: f64,
    pub real_interest_rate: f64,
    pub years_out: f64,
    pub real_interest_inflator: f64,
    pub real_discount_rate: f64,
    pub ladder_amount_today: f64,
    pub inflation_inflator: f64,
    pub inflation_deflator: f64,
    pub nominal_interest_rate: f64,
    pub amount_in_play: f64,
    pub taxable_gain: f64,
    pub taxes: f64,
    pub nominal_income_pretax: f64,
    pub nominal_income_posttax: f64,
    pub real_posttax_income: f64,
    pub total_discount_factor: f64,
    pub total_discount_divisor: f64,
    pub nominal_income_discounted: f64,
    pub nominal_aftertax_discounted: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LadderResult {
    pub steps: Vec<LadderStep>,
    pub total_investment_required: f64,
    pub total_real_income: f64,
    pub post_tax_yield: f64,
    pub npv_taxes: f64,
    pub post_tax_real_gain: f64,
}
