use crate::errors::AppError;
use crate::models::{IngestResponse, Report, ReportQuery};
use crate::reports::{self, authorize};
use crate::state::AppState;
use crate::stats::build_view;
use crate::ui::{render_dashboard, render_empty, render_history, render_unreadable};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Html,
    Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::error;

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> (StatusCode, Html<String>) {
    let date = query.date.filter(|date| !date.is_empty());
    let fetched = reports::fetch(&state.store, date.as_deref()).await;
    let (status, html) = dashboard_page(fetched, date.as_deref());
    (status, Html(html))
}

fn dashboard_page(fetched: Result<Value, AppError>, date: Option<&str>) -> (StatusCode, String) {
    let report = match fetched {
        Ok(report) => report,
        Err(err) if err.status == StatusCode::NOT_FOUND => {
            return (StatusCode::OK, render_empty(date));
        }
        Err(err) => return (err.status, render_unreadable(&err.message)),
    };

    match serde_json::from_value::<Report>(report) {
        Ok(report) => (
            StatusCode::OK,
            render_dashboard(&build_view(&report), date.is_some()),
        ),
        Err(err) => {
            error!("stored report does not match the dashboard schema: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, render_unreadable(&err.to_string()))
        }
    }
}

pub async fn history(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let dates = reports::list_dates(&state.store).await?;
    Ok(Html(render_history(&dates)))
}

pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Value>, AppError> {
    let report = reports::fetch(&state.store, query.date.as_deref()).await?;
    Ok(Json(report))
}

pub async fn get_dates(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(reports::list_dates(&state.store).await?))
}

pub async fn post_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestResponse>, AppError> {
    let header = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
    authorize(&state.config, header)?;

    let report: Value = serde_json::from_slice(&body)
        .map_err(|err| AppError::bad_request(format!("invalid report body: {err}")))?;

    let date = reports::ingest(&state.store, &report, Utc::now().date_naive()).await?;
    Ok(Json(IngestResponse {
        success: true,
        date,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn store_failure_renders_html_notice() {
        let failure = AppError::internal(std::io::Error::other("disk unavailable"));

        let (status, html) = dashboard_page(Err(failure), None);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("could not be read: disk unavailable"));
        assert!(!html.contains(r#"{"error""#));
    }

    #[test]
    fn missing_report_renders_empty_state() {
        let (status, html) = dashboard_page(Err(AppError::not_found()), Some("2026-01-01"));
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("No report found for 2026-01-01"));
    }

    #[test]
    fn loosely_typed_report_still_renders() {
        let report = json!({
            "report_date": "2026-01-05",
            "summary": { "total_visits": 12.0, "with_pl": 3, "pl_conversion": "25.0" },
            "gl": "pending"
        });

        let (status, html) = dashboard_page(Ok(report), None);

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Lighthouse - 2026-01-05"));
        assert!(html.contains("25%"));
        assert!(!html.contains("GL Execution Time"));
    }
}
