//! Wire types and the report document schema.
//!
//! The store keeps reports as raw JSON. [`Report`] is the typed view the
//! dashboard reads. Every field is optional or defaulted, numbers may arrive as
//! numeric strings, and a section of the wrong shape reads as absent, so
//! producers can change the document without breaking rendering.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Report {
    #[serde(deserialize_with = "string_or_number")]
    pub report_date: String,
    #[serde(deserialize_with = "section")]
    pub generated_at: Option<String>,
    #[serde(deserialize_with = "section")]
    pub summary: Summary,
    #[serde(deserialize_with = "section")]
    pub gl: Option<GlStats>,
    #[serde(deserialize_with = "section")]
    pub pl: Option<PlStats>,
    #[serde(deserialize_with = "section")]
    pub loan_ops: Option<LoanOps>,
    #[serde(deserialize_with = "section")]
    pub city_breakdown: Vec<CityRow>,
    #[serde(deserialize_with = "section")]
    pub partner_breakdown: Vec<PartnerRow>,
    #[serde(deserialize_with = "section")]
    pub branch_breakdown: Vec<BranchRow>,
    #[serde(deserialize_with = "section")]
    pub outliers: Vec<Outlier>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Summary {
    #[serde(deserialize_with = "count")]
    pub total_visits: u64,
    #[serde(deserialize_with = "optional_count")]
    pub field_visits: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub dc_visits: Option<u64>,
    #[serde(deserialize_with = "count")]
    pub with_pl: u64,
    /// Precomputed upstream, in percent.
    #[serde(deserialize_with = "optional_number")]
    pub pl_conversion: Option<f64>,
    /// Total disbursed, in rupees.
    #[serde(deserialize_with = "optional_number")]
    pub disbursed_amount: Option<f64>,
}

/// Execution time percentiles in minutes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GlStats {
    #[serde(deserialize_with = "optional_number")]
    pub median: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub p90: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub min: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub max: Option<f64>,
    /// Median minutes per stage, in pipeline order.
    #[serde(deserialize_with = "section")]
    pub stages: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlStats {
    #[serde(deserialize_with = "count")]
    pub count: u64,
    #[serde(deserialize_with = "optional_number")]
    pub median: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub p90: Option<f64>,
    #[serde(deserialize_with = "section")]
    pub stages: Option<PlStages>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlStages {
    #[serde(deserialize_with = "optional_number")]
    pub selection_to_initiate: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub initiate_to_complete: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoanOps {
    #[serde(deserialize_with = "optional_number")]
    pub gl_approval_to_initiate: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub gl_initiate_to_complete: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub sl_initiate_to_complete: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CityRow {
    #[serde(deserialize_with = "string_or_number")]
    pub city: String,
    #[serde(deserialize_with = "count")]
    pub count: u64,
    #[serde(deserialize_with = "optional_count")]
    pub field: Option<u64>,
    #[serde(deserialize_with = "optional_count")]
    pub dc: Option<u64>,
    #[serde(deserialize_with = "optional_number")]
    pub gl_median: Option<f64>,
    #[serde(deserialize_with = "count")]
    pub pl_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartnerRow {
    #[serde(deserialize_with = "string_or_number")]
    pub partner: String,
    #[serde(deserialize_with = "count")]
    pub count: u64,
    #[serde(deserialize_with = "optional_number")]
    pub gl_median: Option<f64>,
    #[serde(deserialize_with = "count")]
    pub pl_count: u64,
    #[serde(deserialize_with = "optional_number")]
    pub pl_median: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BranchRow {
    #[serde(deserialize_with = "string_or_number")]
    pub branch: String,
    #[serde(deserialize_with = "string_or_number")]
    pub partner: String,
    #[serde(deserialize_with = "count")]
    pub count: u64,
    #[serde(deserialize_with = "optional_number")]
    pub gl_median: Option<f64>,
    #[serde(deserialize_with = "count")]
    pub pl_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Outlier {
    #[serde(deserialize_with = "string_or_number")]
    pub visit_id: String,
    #[serde(deserialize_with = "section")]
    pub source: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub city: String,
    #[serde(deserialize_with = "string_or_number")]
    pub branch: String,
    #[serde(deserialize_with = "number_or_zero")]
    pub gl_total: f64,
    #[serde(deserialize_with = "section")]
    pub stages: Option<OutlierStages>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutlierStages {
    #[serde(deserialize_with = "optional_number")]
    pub kyc: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub gold_appraisal: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub gold_sealing: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub esign: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    pub disbursal: Option<f64>,
}

/// A section of the wrong shape reads as absent instead of failing the report.
fn section<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Numbers, or strings holding one such as `"25.0"` or `"25%"`.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    };
    number.filter(|n: &f64| n.is_finite())
}

fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_number(&Value::deserialize(deserializer)?))
}

fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_number(deserializer)?.unwrap_or(0.0))
}

/// Counts round to the nearest whole number; negatives read as absent.
fn optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_number(deserializer)?
        .filter(|n| *n >= 0.0)
        .map(|n| n.round() as u64))
}

fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_count(deserializer)?.unwrap_or(0))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_null_sections_default() {
        let report: Report = serde_json::from_value(json!({
            "report_date": "2026-01-05",
            "summary": { "total_visits": 10, "with_pl": 4 },
            "gl": null,
            "city_breakdown": null
        }))
        .unwrap();

        assert_eq!(report.report_date, "2026-01-05");
        assert_eq!(report.summary.total_visits, 10);
        assert!(report.gl.is_none());
        assert!(report.city_breakdown.is_empty());
        assert!(report.outliers.is_empty());
    }

    #[test]
    fn gl_stage_order_follows_document() {
        let report: Report = serde_json::from_value(json!({
            "gl": { "stages": { "kyc": 5, "gold_appraisal": 12, "esign": 3, "disbursal": 4 } }
        }))
        .unwrap();

        let order: Vec<&str> = report
            .gl
            .as_ref()
            .unwrap()
            .stages
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(order, vec!["kyc", "gold_appraisal", "esign", "disbursal"]);
    }

    #[test]
    fn numeric_visit_ids_are_kept() {
        let report: Report = serde_json::from_value(json!({
            "outliers": [{ "visit_id": 4521, "gl_total": 75 }]
        }))
        .unwrap();
        assert_eq!(report.outliers[0].visit_id, "4521");
    }

    #[test]
    fn numeric_strings_and_fractional_counts_are_read() {
        let report: Report = serde_json::from_value(json!({
            "summary": { "total_visits": 12.0, "with_pl": "3", "pl_conversion": "25.0" },
            "gl": { "median": "41.5", "p90": 70 },
            "city_breakdown": [{ "city": "Pune", "count": "8", "gl_median": "n/a", "pl_count": 2.4 }],
            "outliers": [{ "visit_id": "V1", "gl_total": "95" }]
        }))
        .unwrap();

        assert_eq!(report.summary.total_visits, 12);
        assert_eq!(report.summary.with_pl, 3);
        assert_eq!(report.summary.pl_conversion, Some(25.0));
        let gl = report.gl.unwrap();
        assert_eq!(gl.median, Some(41.5));
        assert_eq!(gl.p90, Some(70.0));
        assert_eq!(report.city_breakdown[0].count, 8);
        assert_eq!(report.city_breakdown[0].gl_median, None);
        assert_eq!(report.city_breakdown[0].pl_count, 2);
        assert_eq!(report.outliers[0].gl_total, 95.0);
    }

    #[test]
    fn mistyped_sections_default_instead_of_failing() {
        let report: Report = serde_json::from_value(json!({
            "report_date": 20260105,
            "generated_at": 1736050000,
            "summary": "pending",
            "gl": "oops",
            "pl": { "count": 4, "stages": "n/a" },
            "partner_breakdown": { "oops": true },
            "outliers": [{ "visit_id": "V2", "city": null, "stages": 7 }]
        }))
        .unwrap();

        assert_eq!(report.report_date, "20260105");
        assert!(report.generated_at.is_none());
        assert_eq!(report.summary.total_visits, 0);
        assert!(report.gl.is_none());
        let pl = report.pl.unwrap();
        assert_eq!(pl.count, 4);
        assert!(pl.stages.is_none());
        assert!(report.partner_breakdown.is_empty());
        assert_eq!(report.outliers[0].city, "");
        assert!(report.outliers[0].stages.is_none());
    }
}
