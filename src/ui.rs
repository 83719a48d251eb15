use crate::stats::{format_minutes, format_number, DashboardView, BRANCH_ROWS};
use std::fmt::Write;

pub fn render_dashboard(view: &DashboardView, historical: bool) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<header class="header">
      <h1 class="title">🏠 Lighthouse</h1>
      <p class="date">{date}</p>
      <nav class="nav"><a href="/">Latest</a> · <a href="/history">History</a></nav>
    </header>"#,
        date = escape_html(&view.report_date),
    );

    if historical {
        let _ = write!(
            body,
            r#"<div class="banner">Historical report for {date}. <a href="/">Back to latest</a></div>"#,
            date = escape_html(&view.report_date),
        );
    }

    summary_section(&mut body, view);
    gl_sections(&mut body, view);
    pl_section(&mut body, view);
    loan_ops_section(&mut body, view);
    city_section(&mut body, view);
    partner_section(&mut body, view);
    branch_section(&mut body, view);
    outlier_section(&mut body, view);

    if let Some(generated) = &view.generated_at {
        let _ = write!(
            body,
            r#"<footer class="footer">Generated: {}</footer>"#,
            escape_html(generated)
        );
    }

    page(&format!("Lighthouse - {}", view.report_date), &body)
}

pub fn render_empty(requested_date: Option<&str>) -> String {
    let message = match requested_date {
        Some(date) => format!("No report found for {}.", escape_html(date)),
        None => "No reports yet. Waiting for first data push.".to_string(),
    };
    let body = format!(
        r#"<h1 class="title">🏠 Lighthouse</h1>
    <p class="subtitle">{message}</p>
    <nav class="nav"><a href="/">Latest</a> · <a href="/history">History</a></nav>"#
    );
    page("Lighthouse", &body)
}

pub fn render_history(dates: &[String]) -> String {
    let mut body = String::from(
        r#"<header class="header">
      <h1 class="title">🏠 Lighthouse</h1>
      <p class="date">Report history</p>
      <nav class="nav"><a href="/">Latest</a></nav>
    </header>"#,
    );

    if dates.is_empty() {
        body.push_str(r#"<p class="subtitle">No reports yet.</p>"#);
    } else {
        body.push_str(r#"<ul class="history">"#);
        for date in dates {
            let date = escape_html(date);
            let _ = write!(body, r#"<li><a href="/?date={date}">{date}</a></li>"#);
        }
        body.push_str("</ul>");
    }

    page("Lighthouse - History", &body)
}

pub fn render_unreadable(message: &str) -> String {
    let body = format!(
        r#"<h1 class="title">🏠 Lighthouse</h1>
    <p class="subtitle">The stored report could not be read: {}</p>"#,
        escape_html(message)
    );
    page("Lighthouse", &body)
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    PAGE_HTML
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{BODY}}", body)
}

fn card(out: &mut String, label: &str, value: &str, subtext: Option<&str>) {
    let _ = write!(
        out,
        r#"<div class="card"><div class="card-label">{label}</div><div class="card-value">{value}</div>"#
    );
    if let Some(subtext) = subtext {
        let _ = write!(out, r#"<div class="card-subtext">{}</div>"#, escape_html(subtext));
    }
    out.push_str("</div>");
}

fn stat(out: &mut String, label: &str, value: &str) {
    let _ = write!(
        out,
        r#"<div class="stat-card"><div class="stat-label">{label}</div><div class="stat-value">{value}</div></div>"#
    );
}

fn section_start(out: &mut String, title: &str) {
    let _ = write!(out, r#"<section class="section"><h2 class="section-title">{title}</h2>"#);
}

fn table(out: &mut String, headers: &[&str], rows: Vec<Vec<String>>) {
    out.push_str("<table><thead><tr>");
    for header in headers {
        let _ = write!(out, "<th>{header}</th>");
    }
    out.push_str("</tr></thead><tbody>");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{cell}</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

fn summary_section(out: &mut String, view: &DashboardView) {
    let summary = &view.summary;
    out.push_str(r#"<div class="card-row">"#);
    card(
        out,
        "Total GL Disbursals",
        &summary.total_visits.to_string(),
        Some(&summary.channel_split),
    );
    card(out, "With PL", &summary.with_pl.to_string(), None);
    let conversion = summary
        .pl_conversion
        .map(|pct| format!("{pct}%"))
        .unwrap_or_else(|| "-".to_string());
    card(out, "PL Conversion", &conversion, None);
    if let Some(disbursed) = &summary.disbursed {
        card(out, "Disbursed", disbursed, None);
    }
    out.push_str("</div>");
}

fn gl_sections(out: &mut String, view: &DashboardView) {
    let Some(gl) = &view.gl else {
        return;
    };

    section_start(out, "GL Execution Time");
    out.push_str(r#"<div class="card-row">"#);
    stat(out, "Median", &format_minutes(gl.median));
    stat(out, "p90", &format_minutes(gl.p90));
    stat(out, "Min", &format_minutes(gl.min));
    stat(out, "Max", &format_minutes(gl.max));
    out.push_str("</div></section>");

    if view.stage_segments.is_empty() {
        return;
    }

    section_start(out, "GL Stage Breakdown (Median)");
    out.push_str(r#"<div class="stage-bar">"#);
    for segment in &view.stage_segments {
        let _ = write!(
            out,
            r#"<div class="stage-segment" style="width: {width:.2}%"><div class="stage-name">{name}</div><div class="stage-time">{minutes}</div></div>"#,
            width = segment.width_pct,
            name = escape_html(&segment.label),
            minutes = format_minutes(Some(segment.minutes)),
        );
    }
    out.push_str("</div></section>");
}

fn pl_section(out: &mut String, view: &DashboardView) {
    let Some(pl) = &view.pl else {
        return;
    };

    section_start(out, "PL Execution Time");
    out.push_str(r#"<div class="card-row">"#);
    stat(out, "Count", &pl.count.to_string());
    stat(out, "Median", &format_minutes(pl.median));
    stat(out, "p90", &format_minutes(pl.p90));
    out.push_str("</div>");

    if let Some(stages) = &pl.stages {
        out.push_str(r#"<div class="card-row">"#);
        stat(
            out,
            "Selection → Initiate",
            &format_minutes(Some(stages.selection_to_initiate.unwrap_or(0.0))),
        );
        stat(
            out,
            "Initiate → Complete",
            &format_minutes(Some(stages.initiate_to_complete.unwrap_or(0.0))),
        );
        out.push_str("</div>");
    }
    out.push_str("</section>");
}

fn loan_ops_section(out: &mut String, view: &DashboardView) {
    let Some(ops) = &view.loan_ops else {
        return;
    };

    section_start(out, "Loan Ops Efficiency (Median)");
    out.push_str(r#"<div class="card-row">"#);
    for (label, value) in [
        ("GL Approval → Initiate", ops.gl_approval_to_initiate),
        ("GL Initiate → Complete", ops.gl_initiate_to_complete),
        ("PL Initiate → Complete", ops.sl_initiate_to_complete),
    ] {
        stat(out, label, &format_minutes(Some(value.unwrap_or(0.0))));
    }
    out.push_str("</div></section>");
}

fn city_section(out: &mut String, view: &DashboardView) {
    if view.cities.is_empty() {
        return;
    }

    section_start(out, "City Breakdown");
    let rows = view
        .cities
        .iter()
        .map(|city| {
            vec![
                escape_html(&city.row.city),
                city.row.count.to_string(),
                city.field.to_string(),
                city.dc.to_string(),
                format_minutes(city.row.gl_median),
                city.row.pl_count.to_string(),
                city.pl_pct.map(|pct| format!("{pct}%")).unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    table(
        out,
        &["City", "Total", "Field", "DC", "GL Median", "PL Count", "PL %"],
        rows,
    );
    out.push_str("</section>");
}

fn partner_section(out: &mut String, view: &DashboardView) {
    if view.partners.is_empty() {
        return;
    }

    section_start(out, "Partner Breakdown");
    let rows = view
        .partners
        .iter()
        .map(|partner| {
            vec![
                escape_html(&partner.partner),
                partner.count.to_string(),
                format_minutes(partner.gl_median),
                partner.pl_count.to_string(),
                format_minutes(partner.pl_median.filter(|m| *m > 0.0)),
            ]
        })
        .collect();
    table(
        out,
        &["Partner", "GL Count", "GL Median", "PL Count", "PL Median"],
        rows,
    );
    out.push_str("</section>");
}

fn branch_section(out: &mut String, view: &DashboardView) {
    if view.branches.is_empty() {
        return;
    }

    let _ = write!(
        out,
        r#"<section class="section"><h2 class="section-title">Branch Breakdown (Top {})</h2>"#,
        BRANCH_ROWS
    );
    let rows = view
        .branches
        .iter()
        .map(|branch| {
            vec![
                escape_html(&branch.branch),
                escape_html(&branch.partner),
                branch.count.to_string(),
                format_minutes(branch.gl_median),
                branch.pl_count.to_string(),
            ]
        })
        .collect();
    table(
        out,
        &["Branch", "Partner", "GL Count", "GL Median", "PL Count"],
        rows,
    );
    out.push_str("</section>");
}

fn outlier_section(out: &mut String, view: &DashboardView) {
    if view.outliers.is_empty() {
        return;
    }

    section_start(out, "Slowest Visits (&gt;60m)");
    let rows = view
        .outliers
        .iter()
        .map(|outlier| {
            let stages = outlier.stages.clone().unwrap_or_default();
            let stage = |value: Option<f64>| format_minutes(value.filter(|m| *m > 0.0));
            vec![
                escape_html(&outlier.visit_id),
                escape_html(outlier.source.as_deref().unwrap_or("Field")),
                escape_html(&outlier.city),
                escape_html(&outlier.branch),
                format!(r#"<strong class="slow">{}m</strong>"#, format_number(outlier.gl_total)),
                stage(stages.kyc),
                stage(stages.gold_appraisal),
                stage(stages.gold_sealing),
                stage(stages.esign),
                stage(stages.disbursal),
            ]
        })
        .collect();
    table(
        out,
        &[
            "Visit ID", "Source", "City", "Branch", "Total", "KYC", "Appraisal", "Sealing",
            "eSign", "Disbursal",
        ],
        rows,
    );
    out.push_str("</section>");
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{{TITLE}}</title>
  <style>
    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      padding: 0;
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
      background-color: #0f172a;
      color: #e2e8f0;
      min-height: 100vh;
    }

    a {
      color: #fbbf24;
    }

    .container {
      max-width: 1200px;
      margin: 0 auto;
      padding: 24px;
    }

    .header {
      margin-bottom: 32px;
    }

    .title {
      font-size: 28px;
      font-weight: 700;
      margin: 0 0 8px 0;
      color: #f8fafc;
    }

    .date,
    .subtitle {
      font-size: 16px;
      color: #94a3b8;
      margin: 0;
    }

    .nav {
      margin-top: 8px;
      font-size: 13px;
      color: #64748b;
    }

    .banner {
      background-color: #1e293b;
      border-left: 4px solid #fbbf24;
      border-radius: 8px;
      padding: 12px 16px;
      margin-bottom: 24px;
      font-size: 14px;
    }

    .card-row {
      display: flex;
      gap: 16px;
      margin-bottom: 24px;
      flex-wrap: wrap;
    }

    .card {
      background-color: #1e293b;
      border-radius: 12px;
      padding: 20px;
      flex: 1;
      min-width: 140px;
    }

    .card-label {
      font-size: 13px;
      color: #94a3b8;
      margin-bottom: 8px;
      text-transform: uppercase;
      letter-spacing: 0.5px;
    }

    .card-value {
      font-size: 32px;
      font-weight: 700;
      color: #f8fafc;
    }

    .card-subtext {
      font-size: 12px;
      color: #64748b;
      margin-top: 4px;
    }

    .section {
      margin-bottom: 32px;
    }

    .section-title {
      font-size: 18px;
      font-weight: 600;
      margin-bottom: 16px;
      color: #f8fafc;
    }

    .stat-card {
      background-color: #1e293b;
      border-radius: 8px;
      padding: 16px;
      text-align: center;
      min-width: 100px;
    }

    .stat-label {
      font-size: 11px;
      color: #94a3b8;
      margin-bottom: 4px;
    }

    .stat-value {
      font-size: 20px;
      font-weight: 600;
      color: #f8fafc;
    }

    .stage-bar {
      display: flex;
      background-color: #1e293b;
      border-radius: 8px;
      overflow: hidden;
      min-height: 60px;
    }

    .stage-segment {
      padding: 12px 8px;
      text-align: center;
      border-right: 1px solid #334155;
      display: flex;
      flex-direction: column;
      justify-content: center;
      min-width: 60px;
    }

    .stage-name {
      font-size: 11px;
      color: #94a3b8;
      margin-bottom: 4px;
    }

    .stage-time {
      font-size: 16px;
      font-weight: 600;
      color: #fbbf24;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      background-color: #1e293b;
      border-radius: 8px;
      overflow: hidden;
    }

    th {
      padding: 12px;
      text-align: left;
      background-color: #334155;
      font-size: 11px;
      font-weight: 600;
      color: #94a3b8;
      text-transform: uppercase;
    }

    td {
      padding: 12px;
      border-bottom: 1px solid #334155;
      font-size: 13px;
    }

    .slow {
      color: #ef4444;
    }

    .history {
      list-style: none;
      padding: 0;
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(140px, 1fr));
      gap: 12px;
    }

    .history li {
      background-color: #1e293b;
      border-radius: 8px;
      padding: 12px 16px;
    }

    .footer {
      margin-top: 40px;
      padding-top: 20px;
      border-top: 1px solid #334155;
      font-size: 12px;
      color: #64748b;
    }
  </style>
</head>
<body>
  <main class="container">
    {{BODY}}
  </main>
</body>
</html>
"#;
