use serde::Serialize;

use super::error::ValidationError;
use super::liability::{
    DEFAULT_CREDIT_PRICE, DEFAULT_TARGET_FRACTION, compute_liability, liability_record,
};
use super::types::LiabilityRecord;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorporateEmitter {
    pub rank: u32,
    pub company: &'static str,
    pub sector: &'static str,
    pub annual_emissions_kg: f64,
    pub country: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorporateLiability {
    #[serde(flatten)]
    pub emitter: CorporateEmitter,
    #[serde(flatten)]
    pub liability: LiabilityRecord,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiabilityTotals {
    pub total_emissions_kg: f64,
    pub total_deficit_kg: f64,
    pub total_liability: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorporateLedger {
    pub target_fraction: f64,
    pub unit_price: f64,
    pub rows: Vec<CorporateLiability>,
    pub totals: LiabilityTotals,
}

impl CorporateLedger {
    pub fn build(
        emitters: &[CorporateEmitter],
        target_fraction: f64,
        unit_price: f64,
    ) -> Result<Self, ValidationError> {
        let rows = emitters
            .iter()
            .map(|emitter| {
                compute_liability(emitter.annual_emissions_kg, target_fraction, unit_price)
                    .map(|liability| CorporateLiability {
                        emitter: *emitter,
                        liability,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rows(rows, target_fraction, unit_price))
    }

    /// The built-in top-20 table at the mandated 55% retention and ₹1.50/kg.
    pub fn standard() -> Self {
        let rows = TOP_EMITTERS
            .iter()
            .map(|emitter| CorporateLiability {
                emitter: *emitter,
                liability: liability_record(
                    emitter.annual_emissions_kg,
                    DEFAULT_TARGET_FRACTION,
                    DEFAULT_CREDIT_PRICE,
                ),
            })
            .collect();
        Self::from_rows(rows, DEFAULT_TARGET_FRACTION, DEFAULT_CREDIT_PRICE)
    }

    fn from_rows(rows: Vec<CorporateLiability>, target_fraction: f64, unit_price: f64) -> Self {
        let mut totals = LiabilityTotals {
            total_emissions_kg: 0.0,
            total_deficit_kg: 0.0,
            total_liability: 0.0,
        };
        for row in &rows {
            totals.total_emissions_kg += row.liability.baseline_quantity;
            totals.total_deficit_kg += row.liability.deficit_quantity;
            totals.total_liability += row.liability.liability_value;
        }
        Self {
            target_fraction,
            unit_price,
            rows,
            totals,
        }
    }

    pub fn find(&self, rank: u32) -> Option<&CorporateLiability> {
        self.rows.iter().find(|row| row.emitter.rank == rank)
    }

    /// Company's share of the table's total emissions, in percent.
    pub fn emission_share_percent(&self, rank: u32) -> Option<f64> {
        let row = self.find(rank)?;
        if self.totals.total_emissions_kg <= 0.0 {
            return Some(0.0);
        }
        Some(row.emitter.annual_emissions_kg / self.totals.total_emissions_kg * 100.0)
    }
}

/// "850.00 Million", "1.20 Billion", or a comma-grouped integer below a million.
pub fn format_large_number(num: f64) -> String {
    if num >= 1e9 {
        format!("{:.2} Billion", num / 1e9)
    } else if num >= 1e6 {
        format!("{:.2} Million", num / 1e6)
    } else {
        group_thousands(num.round())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskSection {
    pub title: &'static str,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskProfile {
    pub summary: String,
    pub sections: Vec<RiskSection>,
}

/// Regulatory and market exposure of a heavy emitter that stays above its
/// safe target.
pub fn risk_profile(company: &str, sector: &str) -> RiskProfile {
    let sections = vec![
        RiskSection {
            title: "SEBI BRSR & Regulatory Fines",
            body: format!(
                "Business Responsibility and Sustainability Reporting makes {company}'s \
                 emissions public. The Indian Carbon Market will levy penalties for every \
                 kg emitted above the allowance."
            ),
        },
        RiskSection {
            title: "Stranded Assets & Export Tariffs",
            body: format!(
                "The EU Carbon Border Adjustment Mechanism places carbon taxes on \
                 {company}'s exports, eroding the value of high-emission {sector} assets."
            ),
        },
        RiskSection {
            title: "ESG Capital Divestment",
            body: format!(
                "Mutual funds and foreign institutional investors screen for ESG \
                 performance, so {company} faces rising borrowing costs and a shrinking \
                 investor base."
            ),
        },
        RiskSection {
            title: "Ecopay B2B Solution",
            body: format!(
                "{company} can close its deficit by buying aggregated, verified credits \
                 from retail platforms such as Ecopay."
            ),
        },
    ];
    RiskProfile {
        summary: format!(
            "{company} is operating far outside India's Net Zero 2070 commitments. As a \
             heavy emitter in the {sector} sector it is exposed to the following risks."
        ),
        sections,
    }
}

fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

macro_rules! emitter {
    ($rank:expr, $company:expr, $sector:expr, $kg:expr) => {
        CorporateEmitter {
            rank: $rank,
            company: $company,
            sector: $sector,
            annual_emissions_kg: $kg,
            country: "India",
        }
    };
}

pub static TOP_EMITTERS: [CorporateEmitter; 20] = [
    emitter!(1, "NTPC Limited", "Power Generation", 850_000_000.0),
    emitter!(2, "Reliance Industries", "Petrochemicals", 720_000_000.0),
    emitter!(3, "Tata Steel", "Manufacturing", 680_000_000.0),
    emitter!(4, "Coal India Ltd", "Mining", 610_000_000.0),
    emitter!(5, "Adani Power", "Power Generation", 590_000_000.0),
    emitter!(6, "Indian Oil Corp (IOCL)", "Oil & Gas", 540_000_000.0),
    emitter!(7, "JSW Steel", "Manufacturing", 490_000_000.0),
    emitter!(8, "UltraTech Cement", "Construction Materials", 460_000_000.0),
    emitter!(9, "ONGC", "Oil & Gas", 420_000_000.0),
    emitter!(10, "Vedanta Limited", "Mining & Metals", 390_000_000.0),
    emitter!(11, "Hindalco Industries", "Metals", 350_000_000.0),
    emitter!(12, "Bharat Petroleum (BPCL)", "Oil & Gas", 310_000_000.0),
    emitter!(13, "Hindustan Petroleum (HPCL)", "Oil & Gas", 280_000_000.0),
    emitter!(14, "Ambuja Cements", "Construction Materials", 250_000_000.0),
    emitter!(15, "Larsen & Toubro (L&T)", "Construction & Engg", 210_000_000.0),
    emitter!(16, "Grasim Industries", "Textiles & Chemicals", 180_000_000.0),
    emitter!(17, "Tata Motors", "Automotive", 150_000_000.0),
    emitter!(18, "Mahindra & Mahindra", "Automotive", 120_000_000.0),
    emitter!(19, "Shree Cement", "Construction Materials", 95_000_000.0),
    emitter!(20, "Maruti Suzuki", "Automotive", 75_000_000.0),
];
