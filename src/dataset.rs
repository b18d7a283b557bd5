// Transaction CSV import for the personal carbon baseline.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// kg CO2e attributed to each rupee of tracked spend.
pub const CARBON_KG_PER_RUPEE: f64 = 0.08;

pub const FALLBACK_CARBON_KG: f64 = 12_500.0;
pub const FALLBACK_SPEND: f64 = 156_250.0;
pub const FALLBACK_TRANSACTIONS: usize = 142;

const AMOUNT_COLUMN: &str = "Amount";
const KIND_COLUMN: &str = "Income/Expense";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read transactions file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed transactions CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("transactions CSV has no '{0}' column")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineSource {
    Dataset,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintBaseline {
    pub carbon_kg: f64,
    pub total_spend: f64,
    pub transaction_count: usize,
    pub source: BaselineSource,
}

impl FootprintBaseline {
    pub fn fallback() -> Self {
        Self {
            carbon_kg: FALLBACK_CARBON_KG,
            total_spend: FALLBACK_SPEND,
            transaction_count: FALLBACK_TRANSACTIONS,
            source: BaselineSource::Fallback,
        }
    }
}

/// Loads the baseline, substituting the fixed fallback on any failure.
pub fn load_footprint(path: Option<&Path>) -> FootprintBaseline {
    let Some(path) = path else {
        debug!("no transactions dataset configured, using fallback baseline");
        return FootprintBaseline::fallback();
    };
    if !path.exists() {
        warn!(path = %path.display(), "transactions dataset not found, using fallback baseline");
        return FootprintBaseline::fallback();
    }
    match read_footprint(path) {
        Ok(baseline) => {
            debug!(
                path = %path.display(),
                spend = baseline.total_spend,
                transactions = baseline.transaction_count,
                "loaded transactions dataset"
            );
            baseline
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unusable transactions dataset, using fallback baseline");
            FootprintBaseline::fallback()
        }
    }
}

pub fn read_footprint(path: &Path) -> Result<FootprintBaseline, DatasetError> {
    let content = std::fs::read(path)?;
    footprint_from_reader(content.as_slice())
}

pub fn footprint_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<FootprintBaseline, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or(DatasetError::MissingColumn(name))
    };
    let amount_idx = column(AMOUNT_COLUMN)?;
    let kind_idx = column(KIND_COLUMN)?;

    let mut total_spend = 0.0;
    let mut transaction_count = 0usize;
    for record in reader.records() {
        let record = record?;
        let is_expense = record
            .get(kind_idx)
            .is_some_and(|kind| kind.to_ascii_lowercase().contains("expense"));
        if !is_expense {
            continue;
        }
        total_spend += record.get(amount_idx).map(parse_amount).unwrap_or(0.0);
        transaction_count += 1;
    }

    Ok(FootprintBaseline {
        carbon_kg: total_spend * CARBON_KG_PER_RUPEE,
        total_spend,
        transaction_count,
        source: BaselineSource::Dataset,
    })
}

/// "1,250.50" -> 1250.5; anything unparseable counts as zero.
fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write csv");
        file
    }

    #[test]
    fn sums_only_expense_rows() {
        let file = write_csv(
            "Date,Mode,Category,Amount,Income/Expense\n\
             20/09/2018,Cash,Food,\"1,250\",Expense\n\
             20/09/2018,Saving Bank account 1,Salary,50000,Income\n\
             21/09/2018,Cash,Transportation,250.5,expense\n\
             22/09/2018,Cash,Gift,abc,Expense\n\
             23/09/2018,Cash,Other,100,Transfer-Out\n",
        );
        let baseline = read_footprint(file.path()).expect("valid csv");

        assert_eq!(baseline.source, BaselineSource::Dataset);
        assert_eq!(baseline.transaction_count, 3);
        assert_approx(baseline.total_spend, 1_500.5);
        assert_approx(baseline.carbon_kg, 1_500.5 * 0.08);
    }

    #[test]
    fn header_matching_ignores_case() {
        let baseline = footprint_from_reader("amount,income/expense\n100,Expense\n".as_bytes())
            .expect("valid csv");
        assert_eq!(baseline.transaction_count, 1);
        assert_approx(baseline.total_spend, 100.0);
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = footprint_from_reader("Date,Amount\n2020-01-01,10\n".as_bytes())
            .expect_err("no classifier column");
        assert!(matches!(err, DatasetError::MissingColumn("Income/Expense")));
    }

    #[test]
    fn no_expenses_yields_zero_baseline() {
        let baseline = footprint_from_reader("Amount,Income/Expense\n500,Income\n".as_bytes())
            .expect("valid csv");
        assert_eq!(baseline.transaction_count, 0);
        assert_approx(baseline.carbon_kg, 0.0);
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let baseline = load_footprint(Some(&dir.path().join("absent.csv")));
        assert_eq!(baseline, FootprintBaseline::fallback());
        assert_eq!(baseline.transaction_count, 142);
        assert_approx(baseline.carbon_kg, 12_500.0);
        assert_approx(baseline.total_spend, 156_250.0);
    }

    #[test]
    fn malformed_file_falls_back() {
        let file = write_csv("Date,Category\nfoo,bar\n");
        assert_eq!(load_footprint(Some(file.path())), FootprintBaseline::fallback());
    }

    #[test]
    fn unconfigured_dataset_falls_back() {
        assert_eq!(load_footprint(None).source, BaselineSource::Fallback);
    }
}
