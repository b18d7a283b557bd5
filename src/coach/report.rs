use serde::{Deserialize, Serialize};

use super::CoachError;

pub const IMPROVEMENT_COUNT: usize = 3;
pub const ACTION_PLAN_WEEKS: usize = 4;

/// Carbon report as returned by the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EcoReport {
    pub total_carbon_tons: f64,
    pub comparison_to_average: String,
    pub breakdown: Breakdown,
    pub improvements: Vec<Improvement>,
    pub action_plan_30_days: Vec<WeeklyAction>,
}

/// Percent of the footprint per lifestyle category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Breakdown {
    pub transport: f64,
    pub diet: f64,
    pub energy: f64,
    pub shopping: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Improvement {
    pub title: String,
    pub impact: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeeklyAction {
    pub week: String,
    pub focus: String,
    pub action: String,
}

impl EcoReport {
    pub fn validate(&self) -> Result<(), CoachError> {
        if !self.total_carbon_tons.is_finite() || self.total_carbon_tons < 0.0 {
            return Err(CoachError::Schema(format!(
                "total_carbon_tons must be a non-negative number, got {}",
                self.total_carbon_tons
            )));
        }
        require_text("comparison_to_average", &self.comparison_to_average)?;

        for (category, percent) in [
            ("Transport", self.breakdown.transport),
            ("Diet", self.breakdown.diet),
            ("Energy", self.breakdown.energy),
            ("Shopping", self.breakdown.shopping),
        ] {
            if !(0.0..=100.0).contains(&percent) {
                return Err(CoachError::Schema(format!(
                    "breakdown.{category} must be between 0 and 100, got {percent}"
                )));
            }
        }

        if self.improvements.len() != IMPROVEMENT_COUNT {
            return Err(CoachError::Schema(format!(
                "expected {IMPROVEMENT_COUNT} improvements, got {}",
                self.improvements.len()
            )));
        }
        for item in &self.improvements {
            require_text("improvements.title", &item.title)?;
            require_text("improvements.impact", &item.impact)?;
            require_text("improvements.description", &item.description)?;
        }

        if self.action_plan_30_days.len() != ACTION_PLAN_WEEKS {
            return Err(CoachError::Schema(format!(
                "expected {ACTION_PLAN_WEEKS} action plan weeks, got {}",
                self.action_plan_30_days.len()
            )));
        }
        for step in &self.action_plan_30_days {
            require_text("action_plan_30_days.week", &step.week)?;
            require_text("action_plan_30_days.focus", &step.focus)?;
            require_text("action_plan_30_days.action", &step.action)?;
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), CoachError> {
    if value.trim().is_empty() {
        return Err(CoachError::Schema(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Strict decode of the model's reply. A JSON object wrapped in prose or a
/// markdown fence is accepted with a warning; any schema mismatch is an error.
pub fn decode_report(content: &str) -> Result<(EcoReport, Vec<String>), CoachError> {
    let mut warnings = Vec::new();
    let report: EcoReport = match serde_json::from_str(content) {
        Ok(report) => report,
        Err(direct_err) => {
            let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) else {
                return Err(CoachError::Parse(format!("response is not JSON: {direct_err}")));
            };
            if end < start {
                return Err(CoachError::Parse(format!("response is not JSON: {direct_err}")));
            }
            let report = serde_json::from_str(&content[start..=end])
                .map_err(|e| CoachError::Parse(e.to_string()))?;
            warnings.push("Response contained extra text around JSON".to_string());
            report
        }
    };
    report.validate()?;
    Ok((report, warnings))
}

/// Canned report served whenever live generation is unavailable.
pub fn fallback_report() -> EcoReport {
    let improvement = |title: &str, impact: &str, description: &str| Improvement {
        title: title.to_string(),
        impact: impact.to_string(),
        description: description.to_string(),
    };
    let week = |week: &str, focus: &str, action: &str| WeeklyAction {
        week: week.to_string(),
        focus: focus.to_string(),
        action: action.to_string(),
    };

    EcoReport {
        total_carbon_tons: 8.4,
        comparison_to_average: "15% above global average".to_string(),
        breakdown: Breakdown {
            transport: 45.0,
            diet: 25.0,
            energy: 20.0,
            shopping: 10.0,
        },
        improvements: vec![
            improvement(
                "Adopt a Hybrid Commute",
                "Save 1.2 tons/yr",
                "Replacing just two days of driving with public transit or work-from-home reduces your transport footprint significantly.",
            ),
            improvement(
                "Plant-Based Weekends",
                "Save 0.6 tons/yr",
                "Cutting out red meat specifically on weekends slashes your diet-related methane footprint without requiring a full lifestyle shift.",
            ),
            improvement(
                "Vampire Energy Purge",
                "Save 0.3 tons/yr",
                "Using smart power strips to cut power to dormant electronics (TVs, chargers, consoles) stops passive energy drain.",
            ),
        ],
        action_plan_30_days: vec![
            week(
                "Week 1",
                "Audit & Awareness",
                "Calculate your baseline and unplug all unused electronics. Set up recycling bins clearly.",
            ),
            week(
                "Week 2",
                "Dietary Shifts",
                "Meal prep 3 fully vegetarian days. Source groceries from local farmers markets if possible.",
            ),
            week(
                "Week 3",
                "Mobility Change",
                "Take public transport, walk, or carpool for at least 50% of your total weekly journeys.",
            ),
            week(
                "Week 4",
                "Sustainable Consumption",
                "Cancel unnecessary physical subscriptions. Commit to buying zero new clothing this month.",
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_json(improvements: usize, weeks: usize) -> String {
        let mut report = serde_json::to_value(fallback_report()).expect("serialize");
        let items = report["improvements"].as_array().expect("array").clone();
        report["improvements"] = serde_json::Value::Array(
            items.into_iter().cycle().take(improvements).collect(),
        );
        let plan = report["action_plan_30_days"].as_array().expect("array").clone();
        report["action_plan_30_days"] =
            serde_json::Value::Array(plan.into_iter().cycle().take(weeks).collect());
        report.to_string()
    }

    #[test]
    fn fallback_satisfies_its_own_schema() {
        fallback_report().validate().expect("fallback is valid");
    }

    #[test]
    fn decodes_exact_schema() {
        let (report, warnings) = decode_report(&report_json(3, 4)).expect("valid report");
        assert_eq!(report, fallback_report());
        assert!(warnings.is_empty());
    }

    #[test]
    fn accepts_fenced_json_with_warning() {
        let content = format!("Here is your report:\n```json\n{}\n```", report_json(3, 4));
        let (report, warnings) = decode_report(&content).expect("valid report");
        assert_eq!(report.total_carbon_tons, 8.4);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn rejects_wrong_item_counts() {
        assert!(matches!(
            decode_report(&report_json(2, 4)),
            Err(CoachError::Schema(_))
        ));
        assert!(matches!(
            decode_report(&report_json(3, 3)),
            Err(CoachError::Schema(_))
        ));
    }

    #[test]
    fn rejects_unknown_and_missing_fields() {
        let mut value = serde_json::to_value(fallback_report()).expect("serialize");
        value["confidence"] = serde_json::json!(0.9);
        assert!(decode_report(&value.to_string()).is_err());

        let mut value = serde_json::to_value(fallback_report()).expect("serialize");
        value.as_object_mut().expect("object").remove("breakdown");
        assert!(decode_report(&value.to_string()).is_err());
    }

    #[test]
    fn rejects_out_of_range_breakdown() {
        let mut value = serde_json::to_value(fallback_report()).expect("serialize");
        value["breakdown"]["Diet"] = serde_json::json!(140);
        assert!(matches!(
            decode_report(&value.to_string()),
            Err(CoachError::Schema(_))
        ));
    }

    #[test]
    fn rejects_prose() {
        assert!(matches!(
            decode_report("Sorry, I cannot help with that."),
            Err(CoachError::Parse(_))
        ));
    }
}
