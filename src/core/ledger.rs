use super::error::{ValidationError, non_negative};
use super::types::FootprintLedger;

pub fn net_footprint(baseline: f64, cumulative_offset: f64) -> f64 {
    (baseline - cumulative_offset).max(0.0)
}

impl FootprintLedger {
    pub fn new(baseline: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            baseline: non_negative("baseline", baseline)?,
            cumulative_offset: 0.0,
        })
    }

    pub fn net(&self) -> f64 {
        net_footprint(self.baseline, self.cumulative_offset)
    }

    /// Offsets only accumulate; negative amounts are rejected.
    pub fn apply_offset(&mut self, amount: f64) -> Result<(), ValidationError> {
        self.cumulative_offset += non_negative("offset", amount)?;
        Ok(())
    }

    pub fn is_neutralized(&self) -> bool {
        self.baseline > 0.0 && self.net() == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    #[test]
    fn offsets_reduce_net_footprint() {
        let mut ledger = FootprintLedger::new(12_500.0).expect("valid");
        ledger.apply_offset(4_250.0).expect("valid offset");
        ledger.apply_offset(1_250.0).expect("valid offset");

        assert_eq!(ledger.cumulative_offset, 5_500.0);
        assert_eq!(ledger.net(), 7_000.0);
        assert!(!ledger.is_neutralized());
    }

    #[test]
    fn heavy_offsets_floor_at_zero() {
        let mut ledger = FootprintLedger::new(1_000.0).expect("valid");
        ledger.apply_offset(4_250.0).expect("valid offset");
        assert_eq!(ledger.net(), 0.0);
        assert!(ledger.is_neutralized());
    }

    #[test]
    fn zero_baseline_is_never_reported_neutralized() {
        let ledger = FootprintLedger::new(0.0).expect("valid");
        assert_eq!(ledger.net(), 0.0);
        assert!(!ledger.is_neutralized());
    }

    #[test]
    fn negative_offset_leaves_ledger_untouched() {
        let mut ledger = FootprintLedger::new(1_000.0).expect("valid");
        let err = ledger.apply_offset(-50.0).expect_err("must reject");
        assert!(matches!(err, ValidationError::Negative { field: "offset", .. }));
        assert!(ledger.apply_offset(f64::NAN).is_err());
        assert_eq!(ledger.cumulative_offset, 0.0);
    }

    proptest! {
        #[test]
        fn prop_net_footprint_is_never_negative(
            baseline in 0.0f64..1e9,
            offset in 0.0f64..1e9
        ) {
            let net = net_footprint(baseline, offset);
            prop_assert!(net >= 0.0);
            if offset >= baseline {
                prop_assert_eq!(net, 0.0);
            } else {
                prop_assert!(net > 0.0);
            }
        }

        #[test]
        fn prop_offsets_are_monotonic(offsets in proptest::collection::vec(0.0f64..1e6, 0..20)) {
            let mut ledger = FootprintLedger::new(5e6).expect("valid");
            let mut previous_net = ledger.net();
            for amount in offsets {
                ledger.apply_offset(amount).expect("non-negative offset");
                prop_assert!(ledger.net() <= previous_net);
                previous_net = ledger.net();
            }
        }
    }
}
