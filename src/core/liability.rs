use super::error::{ValidationError, non_negative, within};
use super::types::LiabilityRecord;

/// Share of current emissions a company may keep under the reduction mandate.
pub const DEFAULT_TARGET_FRACTION: f64 = 0.55;
/// Market price of one kg of carbon credit, in rupees.
pub const DEFAULT_CREDIT_PRICE: f64 = 1.50;

pub fn compute_liability(
    baseline_quantity: f64,
    target_fraction: f64,
    unit_price: f64,
) -> Result<LiabilityRecord, ValidationError> {
    let baseline_quantity = non_negative("baseline_quantity", baseline_quantity)?;
    let target_fraction = within("target_fraction", target_fraction, 0.0, 1.0)?;
    let unit_price = non_negative("unit_price", unit_price)?;
    Ok(liability_record(baseline_quantity, target_fraction, unit_price))
}

pub(crate) fn liability_record(
    baseline_quantity: f64,
    target_fraction: f64,
    unit_price: f64,
) -> LiabilityRecord {
    let deficit_quantity = baseline_quantity * (1.0 - target_fraction);
    LiabilityRecord {
        baseline_quantity,
        target_fraction,
        unit_price,
        safe_target_quantity: baseline_quantity * target_fraction,
        deficit_quantity,
        liability_value: deficit_quantity * unit_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn mandated_reduction_on_small_baseline() {
        let record = compute_liability(1_000.0, 0.55, 1.5).expect("valid");
        assert_approx(record.deficit_quantity, 450.0);
        assert_approx(record.safe_target_quantity, 550.0);
        assert_approx(record.liability_value, 675.0);
    }

    #[test]
    fn full_retention_has_no_liability() {
        let record = compute_liability(5_000.0, 1.0, 1.5).expect("valid");
        assert_approx(record.deficit_quantity, 0.0);
        assert_approx(record.liability_value, 0.0);
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        for fraction in [-0.01, 1.01, f64::INFINITY] {
            assert!(compute_liability(1_000.0, fraction, 1.5).is_err());
        }
    }

    #[test]
    fn rejects_negative_baseline_and_price() {
        assert!(matches!(
            compute_liability(-1.0, 0.55, 1.5),
            Err(ValidationError::Negative { field: "baseline_quantity", .. })
        ));
        assert!(matches!(
            compute_liability(1.0, 0.55, -1.5),
            Err(ValidationError::Negative { field: "unit_price", .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_target_and_deficit_partition_baseline(
            baseline in 0u64..2_000_000_000,
            fraction_bp in 0u32..=10_000,
            price_paise in 0u32..1_000
        ) {
            let baseline = baseline as f64;
            let record = compute_liability(
                baseline,
                fraction_bp as f64 / 10_000.0,
                price_paise as f64 / 100.0,
            ).expect("valid");

            let tol = 1e-9 * baseline.max(1.0);
            prop_assert!(record.deficit_quantity >= -tol);
            prop_assert!((record.safe_target_quantity + record.deficit_quantity - baseline).abs() <= tol);
            prop_assert!(record.liability_value >= -tol);
        }
    }
}
