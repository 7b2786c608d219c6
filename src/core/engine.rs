use super::types::{LadderError, LadderInput, LadderResult, LadderStep};

/// Price every rung of the ladder, then aggregate the portfolio metrics.
///
/// Pure function of its input: one pass over the target income stream, one
/// step per future year, no I/O. Fails as a whole on the first step whose
/// rates fall outside the compounding domain; no partial results.
pub fn calculate_ladder(input: &LadderInput) -> Result<LadderResult, LadderError> {
    let mut steps = Vec::with_capacity(input.target_income_stream.len());
    let mut total_investment = 0.0;

    for (i, &target_income) in input.target_income_stream.iter().enumerate() {
        // Mid-year payment convention.
        let years_out = i as f64 + 0.5;
        let real_interest_rate = input.curve.yield_at(years_out);

        let step = calculate_step(
            input.current_age + i as u32,
            input.current_year + i as i32,
            target_income,
            real_interest_rate,
            years_out,
            input.inflation_rate,
            input.tax_rate,
        )?;

        total_investment += step.ladder_amount_today;
        steps.push(step);
    }

    let total_real_income: f64 = steps.iter().map(|s| s.real_posttax_income).sum();
    let npv_taxes: f64 = steps
        .iter()
        .map(|s| s.nominal_aftertax_discounted - s.nominal_income_discounted)
        .sum();
    let post_tax_real_gain = if total_investment > 0.0 {
        total_real_income / total_investment - 1.0
    } else {
        0.0
    };

    let post_tax_yield = post_tax_yield(&steps);

    Ok(LadderResult {
        steps,
        total_investment_required: total_investment,
        total_real_income,
        post_tax_yield,
        npv_taxes,
        post_tax_real_gain,
    })
}

fn calculate_step(
    age: u32,
    year: i32,
    target_income: f64,
    real_interest_rate: f64,
    years_out: f64,
    inflation_rate: f64,
    tax_rate: f64,
) -> Result<LadderStep, LadderError> {
    // Fractional exponents require a strictly positive base.
    let real_growth = 1.0 + real_interest_rate;
    if real_growth <= 0.0 {
        return Err(LadderError::RateBelowFloor {
            rate: real_interest_rate,
            years_out,
        });
    }
    let inflation_growth = 1.0 + inflation_rate;
    if inflation_growth <= 0.0 {
        return Err(LadderError::RateBelowFloor {
            rate: inflation_rate,
            years_out,
        });
    }

    let real_interest_inflator = real_growth.powf(years_out);
    let real_discount_rate = 1.0 / real_interest_inflator;
    let inflation_inflator = inflation_growth.powf(years_out);
    let inflation_deflator = 1.0 / inflation_inflator;
    let nominal_interest_rate = real_growth * inflation_growth - 1.0;

    // Present value of the inflation-protected principal for this year,
    // and its value once compounded to the payout date.
    let ladder_amount_today = target_income * real_discount_rate;
    let amount_in_play = ladder_amount_today * real_interest_inflator;

    // Only the real gain is taxed: TIPS phantom-income treatment.
    let taxable_gain = amount_in_play - ladder_amount_today;
    let taxes = taxable_gain * tax_rate;

    let nominal_income_pretax = target_income * inflation_inflator;
    let nominal_income_posttax = nominal_income_pretax - taxes;
    let real_posttax_income = nominal_income_posttax * inflation_deflator;

    let total_discount_factor = (1.0 + nominal_interest_rate).powf(years_out);
    let total_discount_divisor = 1.0 / total_discount_factor;
    let nominal_income_discounted = nominal_income_pretax * total_discount_divisor;
    let nominal_aftertax_discounted = nominal_income_posttax * total_discount_divisor;

    Ok(LadderStep {
        age,
        year,
        target_income,
        real_interest_rate,
        years_out,
        real_interest_inflator,
        real_discount_rate,
        ladder_amount_today,
        inflation_inflator,
        inflation_deflator,
        nominal_interest_rate,
        amount_in_play,
        taxable_gain,
        taxes,
        nominal_income_pretax,
        nominal_income_posttax,
        real_posttax_income,
        total_discount_factor,
        total_discount_divisor,
        nominal_income_discounted,
        nominal_aftertax_discounted,
    })
}

// Blended average-maturity approximation, not a true IRR solve. The sums
// are recomputed from the steps rather than reused from the loop totals.
fn post_tax_yield(steps: &[LadderStep]) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }

    let total_investment: f64 = steps.iter().map(|s| s.ladder_amount_today).sum();
    let total_posttax_income: f64 = steps.iter().map(|s| s.real_posttax_income).sum();

    if total_investment == 0.0 {
        return 0.0;
    }

    let avg_years = steps.iter().map(|s| s.years_out).sum::<f64>() / steps.len() as f64;
    (total_posttax_income / total_investment).powf(1.0 / avg_years) - 1.0
}
