use super::error::{ValidationError, positive, within};
use super::types::{
    ContributionPlan, LumpSumProjection, MONTHS_PER_YEAR, ProjectionPoint, ProjectionSummary,
};

pub const DEFAULT_LUMP_SUM_YEARS: u32 = 5;
pub const MAX_LUMP_SUM_YEARS: u32 = 50;

pub fn project(
    periodic_amount: f64,
    annual_rate_percent: f64,
    duration_years: u32,
    yield_per_thousand: f64,
) -> Result<Vec<ProjectionPoint>, ValidationError> {
    let plan = ContributionPlan::new(
        periodic_amount,
        annual_rate_percent,
        duration_years,
        yield_per_thousand,
    )?;
    Ok(project_plan(&plan))
}

/// Month-by-month SIP growth. Each contribution lands before that month's
/// interest is applied; secondary units accrue linearly per contribution.
///
/// One point is emitted per completed year, plus a trailing point for a
/// partial final year.
pub fn project_plan(plan: &ContributionPlan) -> Vec<ProjectionPoint> {
    let months = plan.duration_months;
    let growth = 1.0 + plan.monthly_rate();
    let monthly_units = plan.monthly_secondary_units();

    let mut points = Vec::with_capacity((months / MONTHS_PER_YEAR + 1) as usize);
    let mut value = 0.0;
    let mut units = 0.0;

    for month in 1..=months {
        value = (value + plan.periodic_amount) * growth;
        units += monthly_units;

        if month % MONTHS_PER_YEAR == 0 || month == months {
            points.push(ProjectionPoint {
                period_index: month,
                cumulative_contribution: plan.periodic_amount * month as f64,
                compounded_value: value,
                cumulative_secondary_units: units,
            });
        }
    }

    points
}

pub fn summarize_projection(points: &[ProjectionPoint]) -> ProjectionSummary {
    let Some(last) = points.last() else {
        return ProjectionSummary {
            total_contributed: 0.0,
            final_value: 0.0,
            wealth_gain: 0.0,
            total_secondary_units: 0.0,
        };
    };
    ProjectionSummary {
        total_contributed: last.cumulative_contribution,
        final_value: last.compounded_value,
        wealth_gain: last.compounded_value - last.cumulative_contribution,
        total_secondary_units: last.cumulative_secondary_units,
    }
}

/// One-off investment compounded once a year.
pub fn project_lump_sum(
    principal: f64,
    annual_rate_percent: f64,
    years: u32,
) -> Result<LumpSumProjection, ValidationError> {
    let principal = positive("principal", principal)?;
    let rate = within("annual_rate_percent", annual_rate_percent, -100.0, 100.0)? / 100.0;
    if years > MAX_LUMP_SUM_YEARS {
        return Err(ValidationError::OutOfRange {
            field: "years",
            value: f64::from(years),
            min: 0.0,
            max: f64::from(MAX_LUMP_SUM_YEARS),
        });
    }

    let projected_value = principal * (1.0 + rate).powf(f64::from(years));
    let net_gain = projected_value - principal;
    Ok(LumpSumProjection {
        principal,
        years,
        projected_value,
        net_gain,
        gain_percent: net_gain / principal * 100.0,
    })
}
