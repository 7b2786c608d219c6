use super::types::{LadderError, YieldPoint};

/// TIPS yield curve: piecewise-linear between known maturities, flat beyond
/// the ends.
#[derive(Debug, Clone)]
pub struct YieldCurve {
    points: Vec<YieldPoint>,
}

impl YieldCurve {
    /// Build a curve from an unordered point set. A later point at the same
    /// maturity replaces the earlier one.
    pub fn new(points: &[YieldPoint]) -> Result<Self, LadderError> {
        if points.is_empty() {
            return Err(LadderError::EmptyYieldCurve);
        }

        let mut unique: Vec<YieldPoint> = Vec::with_capacity(points.len());
        for point in points {
            match unique
                .iter_mut()
                .find(|p| p.maturity_years == point.maturity_years)
            {
                Some(existing) => existing.yield_rate = point.yield_rate,
                None => unique.push(*point),
            }
        }
        unique.sort_by(|a, b| a.maturity_years.total_cmp(&b.maturity_years));

        Ok(Self { points: unique })
    }

    /// Yield for an arbitrary horizon. An exact maturity returns the stored
    /// yield unchanged; a gap between maturities is linearly interpolated;
    /// a horizon beyond either end takes the nearest end's yield.
    pub fn yield_at(&self, years_out: f64) -> f64 {
        if let Some(point) = self
            .points
            .iter()
            .find(|p| p.maturity_years == years_out)
        {
            return point.yield_rate;
        }

        let mut lower: Option<YieldPoint> = None;
        let mut upper: Option<YieldPoint> = None;
        for point in &self.points {
            if point.maturity_years <= years_out {
                lower = Some(*point);
            } else {
                upper = Some(*point);
                break;
            }
        }

        match (lower, upper) {
            (Some(lo), Some(hi)) => {
                let weight =
                    (years_out - lo.maturity_years) / (hi.maturity_years - lo.maturity_years);
                lo.yield_rate + weight * (hi.yield_rate - lo.yield_rate)
            }
            // Horizon shorter than the front of the curve.
            (None, _) => self.points[0].yield_rate,
            // Horizon beyond the back of the curve.
            (Some(lo), None) => lo.yield_rate,
        }
    }
}
