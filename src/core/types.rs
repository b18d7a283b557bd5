use serde::Serialize;

use super::error::{ValidationError, non_negative, within};

pub const MONTHS_PER_YEAR: u32 = 12;

/// Yield factors are quoted per this many currency units contributed.
pub const YIELD_UNIT: f64 = 1_000.0;

/// Longest plan accepted, in years and in months.
pub const MAX_DURATION_YEARS: u32 = 50;
pub const MAX_DURATION_MONTHS: u32 = MAX_DURATION_YEARS * MONTHS_PER_YEAR;

/// A recurring monthly contribution plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionPlan {
    pub periodic_amount: f64,
    pub annual_rate_percent: f64,
    pub duration_months: u32,
    /// Secondary units produced per `YIELD_UNIT` contributed, per contribution.
    pub yield_per_thousand: f64,
}

impl ContributionPlan {
    pub fn new(
        periodic_amount: f64,
        annual_rate_percent: f64,
        duration_years: u32,
        yield_per_thousand: f64,
    ) -> Result<Self, ValidationError> {
        if duration_years == 0 {
            return Err(ValidationError::ZeroDuration {
                field: "duration_years",
            });
        }
        let duration_months = duration_years
            .checked_mul(MONTHS_PER_YEAR)
            .filter(|months| *months <= MAX_DURATION_MONTHS)
            .ok_or(ValidationError::OutOfRange {
                field: "duration_years",
                value: f64::from(duration_years),
                min: 1.0,
                max: f64::from(MAX_DURATION_YEARS),
            })?;
        Self::with_months(
            periodic_amount,
            annual_rate_percent,
            duration_months,
            yield_per_thousand,
        )
    }

    pub fn with_months(
        periodic_amount: f64,
        annual_rate_percent: f64,
        duration_months: u32,
        yield_per_thousand: f64,
    ) -> Result<Self, ValidationError> {
        if duration_months == 0 {
            return Err(ValidationError::ZeroDuration {
                field: "duration_months",
            });
        }
        if duration_months > MAX_DURATION_MONTHS {
            return Err(ValidationError::OutOfRange {
                field: "duration_months",
                value: f64::from(duration_months),
                min: 1.0,
                max: f64::from(MAX_DURATION_MONTHS),
            });
        }
        Ok(Self {
            periodic_amount: non_negative("periodic_amount", periodic_amount)?,
            annual_rate_percent: within("annual_rate_percent", annual_rate_percent, -100.0, 100.0)?,
            duration_months,
            yield_per_thousand: non_negative("yield_per_thousand", yield_per_thousand)?,
        })
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate_percent / 100.0 / MONTHS_PER_YEAR as f64
    }

    pub fn monthly_secondary_units(&self) -> f64 {
        self.periodic_amount / YIELD_UNIT * self.yield_per_thousand
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    /// Months elapsed since the first contribution.
    pub period_index: u32,
    pub cumulative_contribution: f64,
    pub compounded_value: f64,
    pub cumulative_secondary_units: f64,
}

impl ProjectionPoint {
    /// Whole years elapsed, as shown on chart axes ("Year 3").
    pub fn year(&self) -> u32 {
        self.period_index / MONTHS_PER_YEAR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub total_contributed: f64,
    pub final_value: f64,
    pub wealth_gain: f64,
    pub total_secondary_units: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LumpSumProjection {
    pub principal: f64,
    pub years: u32,
    pub projected_value: f64,
    pub net_gain: f64,
    pub gain_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiabilityRecord {
    pub baseline_quantity: f64,
    pub target_fraction: f64,
    pub unit_price: f64,
    pub safe_target_quantity: f64,
    pub deficit_quantity: f64,
    pub liability_value: f64,
}

/// Baseline footprint minus accumulated offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintLedger {
    pub baseline: f64,
    pub cumulative_offset: f64,
}
