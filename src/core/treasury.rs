use serde::Serialize;

use super::error::{ValidationError, within};

pub const MIN_BLOCK_TRADE_KG: f64 = 50_000.0;

pub const CORPORATE_BUYERS: [&str; 5] = [
    "Microsoft India",
    "Tata Motors",
    "Infosys Limited",
    "Reliance Industries",
    "Amazon AWS India",
];

/// Aggregated credits from retail SIPs, sold wholesale to corporate buyers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Treasury {
    pub total_platform_credits_kg: f64,
    pub credits_previously_sold_kg: f64,
    /// Spot price in rupees per kg.
    pub spot_price: f64,
}

impl Default for Treasury {
    fn default() -> Self {
        Self {
            total_platform_credits_kg: 2_450_000.0,
            credits_previously_sold_kg: 1_150_000.0,
            spot_price: 1.45,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTrade {
    pub buyer: String,
    pub volume_kg: f64,
    pub spot_price: f64,
    pub gross_value: f64,
}

impl Treasury {
    pub fn available_kg(&self) -> f64 {
        (self.total_platform_credits_kg - self.credits_previously_sold_kg).max(0.0)
    }

    pub fn quote_block_trade(
        &self,
        buyer: &str,
        volume_kg: f64,
    ) -> Result<BlockTrade, ValidationError> {
        let buyer = CORPORATE_BUYERS
            .iter()
            .find(|known| known.eq_ignore_ascii_case(buyer.trim()))
            .ok_or_else(|| ValidationError::UnknownBuyer(buyer.to_string()))?;
        let volume_kg = within("volume_kg", volume_kg, MIN_BLOCK_TRADE_KG, self.available_kg())?;

        Ok(BlockTrade {
            buyer: (*buyer).to_string(),
            volume_kg,
            spot_price: self.spot_price,
            gross_value: volume_kg * self.spot_price,
        })
    }
}
