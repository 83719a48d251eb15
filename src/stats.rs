use crate::models::{as_number, BranchRow, CityRow, GlStats, LoanOps, Outlier, PartnerRow, PlStats, Report};
use chrono::{DateTime, FixedOffset};

pub const BRANCH_ROWS: usize = 15;
pub const OUTLIER_ROWS: usize = 20;

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

#[derive(Debug)]
pub struct DashboardView {
    pub report_date: String,
    pub generated_at: Option<String>,
    pub summary: SummaryView,
    pub gl: Option<GlStats>,
    pub stage_segments: Vec<StageSegment>,
    pub pl: Option<PlStats>,
    pub loan_ops: Option<LoanOps>,
    pub cities: Vec<CityView>,
    pub partners: Vec<PartnerRow>,
    pub branches: Vec<BranchRow>,
    pub outliers: Vec<Outlier>,
}

#[derive(Debug)]
pub struct SummaryView {
    pub total_visits: u64,
    /// e.g. "12 Field · 3 DC"
    pub channel_split: String,
    pub with_pl: u64,
    pub pl_conversion: Option<i64>,
    pub disbursed: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct StageSegment {
    pub label: String,
    pub minutes: f64,
    /// Share of the bar, 0..=100.
    pub width_pct: f64,
}

#[derive(Debug)]
pub struct CityView {
    pub row: CityRow,
    pub field: u64,
    pub dc: u64,
    pub pl_pct: Option<i64>,
}

pub fn build_view(report: &Report) -> DashboardView {
    let summary = &report.summary;
    let field = summary.field_visits.filter(|v| *v > 0).unwrap_or(summary.total_visits);
    let channel_split = match summary.dc_visits.filter(|v| *v > 0) {
        Some(dc) => format!("{field} Field · {dc} DC"),
        None => format!("{field} Field"),
    };

    let pl_conversion = summary
        .pl_conversion
        .map(|value| value.round() as i64)
        .or_else(|| percent(summary.with_pl, summary.total_visits));

    let cities = report
        .city_breakdown
        .iter()
        .map(|row| CityView {
            field: row.field.filter(|v| *v > 0).unwrap_or(row.count),
            dc: row.dc.unwrap_or(0),
            pl_pct: percent(row.pl_count, row.count),
            row: row.clone(),
        })
        .collect();

    DashboardView {
        report_date: report.report_date.clone(),
        generated_at: report.generated_at.as_deref().and_then(format_generated_at),
        summary: SummaryView {
            total_visits: summary.total_visits,
            channel_split,
            with_pl: summary.with_pl,
            pl_conversion,
            disbursed: summary.disbursed_amount.map(format_inr),
        },
        stage_segments: report.gl.as_ref().map(stage_segments).unwrap_or_default(),
        gl: report.gl.clone(),
        pl: report.pl.clone().filter(|pl| pl.count > 0),
        loan_ops: report.loan_ops.clone(),
        cities,
        partners: report.partner_breakdown.clone(),
        branches: report.branch_breakdown.iter().take(BRANCH_ROWS).cloned().collect(),
        outliers: top_outliers(&report.outliers, OUTLIER_ROWS),
    }
}

/// Rounded percentage, `None` when `whole` is zero.
pub fn percent(part: u64, whole: u64) -> Option<i64> {
    if whole == 0 {
        return None;
    }
    Some((part as f64 / whole as f64 * 100.0).round() as i64)
}

/// Rupee amount with Indian digit grouping, e.g. `₹12,34,567`.
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let digits = (amount.abs().round() as u64).to_string();

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{tail}", groups.join(","))
    };

    if negative {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

pub fn stage_label(stage: &str) -> &str {
    match stage {
        "kyc" => "KYC",
        "gold_appraisal" => "Appraisal",
        "gold_sealing" => "Sealing",
        "esign" => "eSign",
        "disbursal" => "Disbursal",
        other => other,
    }
}

/// Bar segments sized by median minutes; each stage counts as at least one minute.
pub fn stage_segments(gl: &GlStats) -> Vec<StageSegment> {
    let stages: Vec<(&str, f64)> = gl
        .stages
        .iter()
        .map(|(name, minutes)| (name.as_str(), as_number(minutes).unwrap_or(0.0)))
        .collect();
    let total: f64 = stages.iter().map(|(_, minutes)| minutes.max(1.0)).sum();

    stages
        .into_iter()
        .map(|(name, minutes)| StageSegment {
            label: stage_label(name).to_string(),
            minutes,
            width_pct: minutes.max(1.0) / total * 100.0,
        })
        .collect()
}

/// The `n` slowest visits by total GL time.
pub fn top_outliers(outliers: &[Outlier], n: usize) -> Vec<Outlier> {
    let mut sorted = outliers.to_vec();
    sorted.sort_by(|a, b| b.gl_total.total_cmp(&a.gl_total));
    sorted.truncate(n);
    sorted
}

pub fn format_generated_at(raw: &str) -> Option<String> {
    let ist = FixedOffset::east_opt(IST_OFFSET_SECS)?;
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(
        parsed
            .with_timezone(&ist)
            .format("%d/%m/%Y, %-I:%M:%S %P IST")
            .to_string(),
    )
}

/// Whole numbers without a fraction, otherwise one decimal place.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

pub fn format_minutes(value: Option<f64>) -> String {
    match value {
        Some(minutes) => format!("{}m", format_number(minutes)),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(value: serde_json::Value) -> Report {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn percent_rounds_and_guards_zero() {
        assert_eq!(percent(1, 3), Some(33));
        assert_eq!(percent(2, 3), Some(67));
        assert_eq!(percent(5, 5), Some(100));
        assert_eq!(percent(3, 0), None);
    }

    #[test]
    fn inr_uses_lakh_grouping() {
        assert_eq!(format_inr(0.0), "₹0");
        assert_eq!(format_inr(999.0), "₹999");
        assert_eq!(format_inr(1000.0), "₹1,000");
        assert_eq!(format_inr(123456.0), "₹1,23,456");
        assert_eq!(format_inr(1234567.4), "₹12,34,567");
        assert_eq!(format_inr(123456789.0), "₹12,34,56,789");
        assert_eq!(format_inr(-2500.0), "-₹2,500");
    }

    #[test]
    fn stage_labels() {
        assert_eq!(stage_label("gold_appraisal"), "Appraisal");
        assert_eq!(stage_label("esign"), "eSign");
        assert_eq!(stage_label("custom_step"), "custom_step");
    }

    #[test]
    fn segments_are_proportional_with_one_minute_floor() {
        let gl: GlStats = serde_json::from_value(json!({
            "stages": { "kyc": 6, "gold_appraisal": 12, "esign": 0, "disbursal": 1 }
        }))
        .unwrap();

        let segments = stage_segments(&gl);
        let labels: Vec<&str> = segments.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["KYC", "Appraisal", "eSign", "Disbursal"]);

        let widths: Vec<f64> = segments.iter().map(|s| s.width_pct).collect();
        assert!((widths[0] - 30.0).abs() < 1e-9);
        assert!((widths[1] - 60.0).abs() < 1e-9);
        assert!((widths[2] - 5.0).abs() < 1e-9);
        assert!((widths[3] - 5.0).abs() < 1e-9);
        assert_eq!(segments[2].minutes, 0.0);
    }

    #[test]
    fn outliers_sorted_slowest_first_and_capped() {
        let r = report(json!({
            "outliers": [
                { "visit_id": "a", "gl_total": 70 },
                { "visit_id": "b", "gl_total": 120 },
                { "visit_id": "c", "gl_total": 95 },
                { "visit_id": "d", "gl_total": 95 }
            ]
        }));

        let top = top_outliers(&r.outliers, 3);
        let ids: Vec<&str> = top.iter().map(|o| o.visit_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "d"]);
    }

    #[test]
    fn generated_at_renders_in_ist() {
        assert_eq!(
            format_generated_at("2026-01-05T03:30:00Z").as_deref(),
            Some("05/01/2026, 9:00:00 am IST")
        );
        assert_eq!(
            format_generated_at("2026-01-05T10:45:10+00:00").as_deref(),
            Some("05/01/2026, 4:15:10 pm IST")
        );
        assert!(format_generated_at("yesterday").is_none());
    }

    #[test]
    fn view_computes_summary_and_city_shares() {
        let branches: Vec<serde_json::Value> =
            (0..20).map(|i| json!({ "branch": format!("B{i}") })).collect();
        let r = report(json!({
            "report_date": "2026-01-05",
            "summary": { "total_visits": 40, "field_visits": 30, "dc_visits": 10, "with_pl": 9 },
            "city_breakdown": [
                { "city": "Chennai", "count": 8, "pl_count": 3, "gl_median": 44 },
                { "city": "Pune", "count": 0, "pl_count": 0 }
            ],
            "branch_breakdown": branches,
            "pl": { "count": 0 }
        }));

        let view = build_view(&r);
        assert_eq!(view.summary.channel_split, "30 Field · 10 DC");
        assert_eq!(view.summary.pl_conversion, Some(23));
        assert_eq!(view.cities[0].pl_pct, Some(38));
        assert_eq!(view.cities[0].field, 8);
        assert_eq!(view.cities[1].pl_pct, None);
        assert_eq!(view.branches.len(), BRANCH_ROWS);
        assert!(view.pl.is_none());
        assert!(view.stage_segments.is_empty());
    }

    #[test]
    fn upstream_conversion_wins() {
        let r = report(json!({
            "summary": { "total_visits": 40, "with_pl": 9, "pl_conversion": 30.6 }
        }));
        assert_eq!(build_view(&r).summary.pl_conversion, Some(31));
        assert_eq!(build_view(&r).summary.channel_split, "40 Field");
    }

    #[test]
    fn minutes_formatting() {
        assert_eq!(format_minutes(Some(42.0)), "42m");
        assert_eq!(format_minutes(Some(41.26)), "41.3m");
        assert_eq!(format_minutes(None), "-");
    }
}
