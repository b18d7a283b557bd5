mod catalog;
mod corporate;
mod engine;
mod error;
mod ledger;
mod liability;
mod treasury;
mod types;

pub use catalog::{
    FUNDS, Fund, FundKind, FundProjection, PROJECTS, Project, SipOverrides, find_project,
    projects_in,
};
pub use corporate::{
    CorporateEmitter, CorporateLedger, CorporateLiability, LiabilityTotals, RiskProfile,
    RiskSection, TOP_EMITTERS, format_large_number, risk_profile,
};
pub use engine::{
    DEFAULT_LUMP_SUM_YEARS, MAX_LUMP_SUM_YEARS, project, project_lump_sum, project_plan,
    summarize_projection,
};
pub use error::ValidationError;
pub(crate) use error::positive;
pub use ledger::net_footprint;
pub use liability::{DEFAULT_CREDIT_PRICE, DEFAULT_TARGET_FRACTION, compute_liability};
pub use treasury::{BlockTrade, CORPORATE_BUYERS, MIN_BLOCK_TRADE_KG, Treasury};
pub use types::{
    ContributionPlan, FootprintLedger, LiabilityRecord, LumpSumProjection, MAX_DURATION_MONTHS,
    MAX_DURATION_YEARS, MONTHS_PER_YEAR, ProjectionPoint, ProjectionSummary, YIELD_UNIT,
};
