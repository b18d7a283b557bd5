use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::engine::{project_lump_sum, project_plan, summarize_projection};
use super::error::ValidationError;
use super::types::{ContributionPlan, LumpSumProjection, ProjectionPoint, ProjectionSummary};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FundKind {
    #[serde(alias = "Solar Energy", alias = "solarEnergy", alias = "solar")]
    SolarEnergy,
    #[serde(alias = "Rural Biogas", alias = "ruralBiogas", alias = "biogas")]
    RuralBiogas,
    #[serde(alias = "Reforestation")]
    Reforestation,
    #[serde(alias = "EV Charging", alias = "evCharging", alias = "ev")]
    EvCharging,
}

impl FundKind {
    pub const ALL: [FundKind; 4] = [
        FundKind::SolarEnergy,
        FundKind::RuralBiogas,
        FundKind::Reforestation,
        FundKind::EvCharging,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FundKind::SolarEnergy => "Solar Energy",
            FundKind::RuralBiogas => "Rural Biogas",
            FundKind::Reforestation => "Reforestation",
            FundKind::EvCharging => "EV Charging",
        }
    }

    pub fn fund(self) -> &'static Fund {
        match self {
            FundKind::SolarEnergy => &FUNDS[0],
            FundKind::RuralBiogas => &FUNDS[1],
            FundKind::Reforestation => &FUNDS[2],
            FundKind::EvCharging => &FUNDS[3],
        }
    }
}

impl fmt::Display for FundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the kebab-case key, the display label or the short alias, ignoring
/// case, spaces and underscores.
impl FromStr for FundKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "solarenergy" | "solar" => Ok(FundKind::SolarEnergy),
            "ruralbiogas" | "biogas" => Ok(FundKind::RuralBiogas),
            "reforestation" => Ok(FundKind::Reforestation),
            "evcharging" | "ev" => Ok(FundKind::EvCharging),
            _ => Err(ValidationError::UnknownFund(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub kind: FundKind,
    pub name: &'static str,
    pub irr_percent: f64,
    /// kg CO2e offset per ₹1000 of each monthly contribution.
    pub carbon_yield_per_thousand: f64,
    pub risk: &'static str,
    pub description: &'static str,
    pub assets_under_management: &'static str,
    pub revenue_model: &'static str,
}

/// Per-request replacements for a fund's own rate and carbon yield.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SipOverrides {
    pub annual_rate_percent: Option<f64>,
    pub yield_per_thousand: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundProjection {
    pub fund: FundKind,
    pub monthly_amount: f64,
    pub annual_rate_percent: f64,
    pub yield_per_thousand: f64,
    pub duration_months: u32,
    pub monthly_impact: f64,
    pub summary: ProjectionSummary,
    pub points: Vec<ProjectionPoint>,
}

impl FundProjection {
    pub fn from_plan(fund: FundKind, plan: &ContributionPlan) -> Self {
        let points = project_plan(plan);
        Self {
            fund,
            monthly_amount: plan.periodic_amount,
            annual_rate_percent: plan.annual_rate_percent,
            yield_per_thousand: plan.yield_per_thousand,
            duration_months: plan.duration_months,
            monthly_impact: plan.monthly_secondary_units(),
            summary: summarize_projection(&points),
            points,
        }
    }
}

impl Fund {
    pub fn monthly_impact(&self, monthly_amount: f64) -> f64 {
        monthly_amount / super::types::YIELD_UNIT * self.carbon_yield_per_thousand
    }

    /// SIP into this fund at its IRR and carbon yield unless overridden.
    pub fn project_sip(
        &self,
        monthly_amount: f64,
        duration_years: u32,
        overrides: SipOverrides,
    ) -> Result<FundProjection, ValidationError> {
        let plan = ContributionPlan::new(
            monthly_amount,
            overrides.annual_rate_percent.unwrap_or(self.irr_percent),
            duration_years,
            overrides
                .yield_per_thousand
                .unwrap_or(self.carbon_yield_per_thousand),
        )?;
        Ok(FundProjection::from_plan(self.kind, &plan))
    }
}

pub static FUNDS: [Fund; 4] = [
    Fund {
        kind: FundKind::SolarEnergy,
        name: "Solar Energy Yield Portfolio",
        irr_percent: 9.5,
        carbon_yield_per_thousand: 850.0,
        risk: "Low-Moderate",
        description: "Invest in utility-scale solar farms. Returns generated through power purchase agreements (PPAs) with state grids.",
        assets_under_management: "₹45.2 Cr",
        revenue_model: "Energy Sales + RECs",
    },
    Fund {
        kind: FundKind::RuralBiogas,
        name: "Rural Biogas Impact Fund",
        irr_percent: 7.2,
        carbon_yield_per_thousand: 1_200.0,
        risk: "Low",
        description: "Funding community bio-digesters. Returns generated from Bio-CNG sales and high-value carbon credit issuance (methane avoidance).",
        assets_under_management: "₹18.5 Cr",
        revenue_model: "Bio-CNG Sales + Carbon Credits",
    },
    Fund {
        kind: FundKind::Reforestation,
        name: "Global Reforestation Trust",
        irr_percent: 4.5,
        carbon_yield_per_thousand: 1_500.0,
        risk: "Moderate",
        description: "Long-term investments in agroforestry and mangrove restoration. Returns purely from the appreciation and sale of premium removal credits.",
        assets_under_management: "₹62.0 Cr",
        revenue_model: "VCS/Gold Standard Credit Sales",
    },
    Fund {
        kind: FundKind::EvCharging,
        name: "EV Infrastructure Growth Fund",
        irr_percent: 11.0,
        carbon_yield_per_thousand: 600.0,
        risk: "High",
        description: "High-growth fund deploying fast-charging networks across Tier 1 & 2 cities. Returns from direct consumer charging revenue.",
        assets_under_management: "₹28.4 Cr",
        revenue_model: "Charging Tariffs + App Subscriptions",
    },
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u32,
    pub name: &'static str,
    pub location: &'static str,
    pub kind: FundKind,
    pub registry: &'static str,
    pub vintage: u16,
    pub price_per_tonne: f64,
    pub rating: &'static str,
    pub sdgs: &'static [&'static str],
    pub description: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub funded_percent: u8,
}

impl Project {
    /// Lump-sum ROI at the parent portfolio's IRR.
    pub fn roi(&self, amount: f64, years: u32) -> Result<LumpSumProjection, ValidationError> {
        project_lump_sum(amount, self.kind.fund().irr_percent, years)
    }
}

pub fn find_project(id: u32) -> Option<&'static Project> {
    PROJECTS.iter().find(|p| p.id == id)
}

/// Projects whose portfolio is in `kinds`, in catalog order.
pub fn projects_in(kinds: &[FundKind]) -> Vec<&'static Project> {
    PROJECTS.iter().filter(|p| kinds.contains(&p.kind)).collect()
}

macro_rules! project {
    ($id:expr, $name:expr, $location:expr, $kind:ident, $registry:expr, $vintage:expr,
     $price:expr, $rating:expr, [$($sdg:expr),*], $description:expr,
     $lat:expr, $lon:expr, $funded:expr) => {
        Project {
            id: $id,
            name: $name,
            location: $location,
            kind: FundKind::$kind,
            registry: $registry,
            vintage: $vintage,
            price_per_tonne: $price,
            rating: $rating,
            sdgs: &[$($sdg),*],
            description: $description,
            lat: $lat,
            lon: $lon,
            funded_percent: $funded,
        }
    };
}

pub static PROJECTS: [Project; 20] = [
    project!(1, "Sundarbans Mangrove Restoration", "West Bengal, India", Reforestation, "Verra (VCS)", 2023,
        1_200.0, "AAA", ["13", "14", "15"],
        "Restoring critical mangrove ecosystems that act as massive carbon sinks and protect against cyclones.",
        21.9497, 88.8993, 78),
    project!(2, "Rajasthan Solar Park Initiative", "Rajasthan, India", SolarEnergy, "Gold Standard", 2024,
        650.0, "A+", ["7", "9", "13"],
        "Replacing coal-fired grid electricity with clean solar power, creating local engineering jobs in Bhadla.",
        27.0238, 74.2179, 45),
    project!(3, "Clean Cookstoves & Biogas Networks", "Odisha, India", RuralBiogas, "Gold Standard", 2023,
        950.0, "AA", ["3", "5", "13"],
        "Distributing efficient biogas digesters to reduce wood burning, significantly improving indoor air quality.",
        20.9517, 85.0985, 92),
    project!(4, "Delhi NCR Fast-Charging Hubs", "Delhi, India", EvCharging, "CDM (UN)", 2024,
        800.0, "A", ["11", "13", "9"],
        "Deploying 50+ high-speed DC fast chargers to accelerate commercial fleet EV adoption.",
        28.7041, 77.1025, 60),
    project!(5, "Tamil Nadu Solar Grid Expansion", "Tamil Nadu, India", SolarEnergy, "Verra (VCS)", 2023,
        700.0, "A", ["7", "13"],
        "Large scale solar farms generating clean energy for the southern grid, offsetting thermal power dependency.",
        8.5241, 77.5892, 85),
    project!(6, "Mumbai EV Highway Corridor", "Maharashtra, India", EvCharging, "Gold Standard", 2024,
        750.0, "A-", ["9", "11", "13"],
        "Strategic EV charging points along the Mumbai-Pune expressway ensuring zero range anxiety.",
        18.7300, 73.6700, 40),
    project!(7, "Kerala Blue Carbon Seagrass", "Kerala, India", Reforestation, "Verra (VCS)", 2023,
        1_400.0, "AAA", ["14", "13"],
        "Restoring seagrass beds which sequester carbon 35x faster than tropical rainforests and support fisheries.",
        9.9312, 76.2673, 30),
    project!(8, "Indore Bio-CNG from Municipal Waste", "Madhya Pradesh, India", RuralBiogas, "Gold Standard", 2023,
        1_100.0, "AA+", ["11", "12", "7"],
        "Converting municipal wet waste into Bio-CNG for public buses, solving waste and energy issues simultaneously.",
        22.7196, 75.8577, 95),
    project!(9, "Assam Rural Biogas Initiative", "Assam, India", RuralBiogas, "Gold Standard", 2024,
        1_000.0, "AA", ["6", "3", "13"],
        "Installing household biogas units to utilize cattle manure, providing clean cooking gas and organic fertilizer.",
        26.2006, 92.9376, 55),
    project!(10, "Regenerative Agriculture Cotton", "Maharashtra, India", Reforestation, "Verra (VCS)", 2023,
        1_300.0, "AAA", ["12", "15", "1"],
        "Supporting farmers to switch to organic, regenerative farming that sequesters carbon in soil.",
        19.7515, 75.7139, 65),
    project!(11, "Western Ghats Biodiversity Protection", "Karnataka, India", Reforestation, "Verra (VCS)", 2022,
        1_600.0, "AAA+", ["15", "13"],
        "REDD+ project preventing deforestation in high-risk zones of the Western Ghats. A vital national carbon sink.",
        14.5200, 75.0500, 88),
    project!(12, "Gujarat Coastal Solar Array", "Gujarat, India", SolarEnergy, "CDM (UN)", 2023,
        680.0, "A", ["7", "13", "8"],
        "Vast solar arrays built on non-arable coastal lands, powering neighboring industrial economic zones.",
        22.2587, 71.1924, 70),
    project!(13, "Punjab Agri-Waste Biogas Plant", "Punjab, India", RuralBiogas, "Gold Standard", 2024,
        720.0, "A+", ["7", "12", "13"],
        "Using agricultural residue for biogas generation instead of burning it in fields, heavily reducing regional smog.",
        31.1471, 75.3412, 50),
    project!(14, "Bangalore Urban Tree Cover", "Karnataka, India", Reforestation, "Local/Verra", 2024,
        1_500.0, "AA", ["11", "15", "3"],
        "Urban afforestation project to combat heat island effect and restore the 'Garden City' reputation.",
        12.9716, 77.5946, 25),
    project!(15, "Bihar Rural Solar Microgrids", "Bihar, India", SolarEnergy, "CDM (UN)", 2022,
        600.0, "B+", ["7", "13"],
        "Deploying decentralized solar microgrids to un-electrified villages, establishing energy independence.",
        25.0961, 85.3131, 98),
    project!(16, "Thar Desert Solar Expansion", "Rajasthan, India", SolarEnergy, "Gold Standard", 2023,
        900.0, "AAA", ["7", "13"],
        "Harnessing extremely high-irradiance zones in the Thar desert for constant, clean daytime baseload power.",
        26.9000, 70.9000, 82),
    project!(17, "Eastern Ghats Coffee Agroforestry", "Andhra Pradesh, India", Reforestation, "Verra (VCS)", 2023,
        1_250.0, "AA+", ["15", "1", "13"],
        "Shade-grown coffee plantations that maintain canopy cover and biodiversity in tribal areas.",
        17.6868, 83.2185, 60),
    project!(18, "Hyderabad Fleet EV Transition", "Telangana, India", EvCharging, "CDM (UN)", 2022,
        550.0, "A", ["9", "12", "13"],
        "Financing and charging infrastructure for the transition of 5000+ logistics delivery vehicles to electric.",
        17.3850, 78.4867, 90),
    project!(19, "Solar Water Pumps for Farmers", "Telangana, India", SolarEnergy, "Gold Standard", 2024,
        850.0, "AA", ["2", "7", "13"],
        "Replacing diesel pumps with solar pumps for irrigation, reducing fossil fuel use and boosting farm profits.",
        18.1124, 79.0193, 35),
    project!(20, "Mahanadi Delta Mangrove Conservation", "Odisha, India", Reforestation, "Verra (VCS)", 2023,
        1_800.0, "AAA+", ["13", "15"],
        "Protecting carbon-rich coastal mangrove swamps from drainage, preserving local marine ecosystems.",
        20.2500, 86.7500, 75),
];
