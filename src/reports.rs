use crate::config::Config;
use crate::errors::AppError;
use crate::storage::KvStore;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{error, info, warn};

pub const LATEST_KEY: &str = "lighthouse:latest";
pub const DATES_KEY: &str = "lighthouse:dates";
pub const MAX_INDEXED_DATES: usize = 30;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn dated_key(date: &str) -> String {
    format!("lighthouse:{date}")
}

pub fn authorize(config: &Config, header: Option<&str>) -> Result<(), AppError> {
    if config.authorizes(header) {
        Ok(())
    } else {
        warn!("rejected report ingestion with missing or invalid token");
        Err(AppError::unauthorized())
    }
}

/// The date a report is filed under: its own `report_date` when set, `today` otherwise.
pub fn effective_date(report: &Value, today: NaiveDate) -> Result<String, AppError> {
    match report.get("report_date") {
        Some(Value::String(date)) if !date.is_empty() => {
            if is_calendar_date(date) {
                Ok(date.clone())
            } else {
                Err(AppError::bad_request(format!(
                    "report_date must be a YYYY-MM-DD date, got '{date}'"
                )))
            }
        }
        None | Some(Value::Null) | Some(Value::String(_)) => {
            Ok(today.format(DATE_FORMAT).to_string())
        }
        Some(other) => Err(AppError::bad_request(format!(
            "report_date must be a YYYY-MM-DD string, got {other}"
        ))),
    }
}

/// Stores `report` as the latest report and under its effective date, then
/// records the date in the index. Earlier writes stay in place if a later one fails.
pub async fn ingest(store: &KvStore, report: &Value, today: NaiveDate) -> Result<String, AppError> {
    let date = effective_date(report, today)?;

    store.set(LATEST_KEY, report).await.map_err(|err| {
        error!("failed to store latest report: {err}");
        AppError::from(err)
    })?;
    store.set(&dated_key(&date), report).await.map_err(|err| {
        error!("failed to store report for {date}: {err}");
        AppError::from(err)
    })?;
    let indexed = store
        .push_unique_bounded(DATES_KEY, &date, MAX_INDEXED_DATES)
        .await
        .map_err(|err| {
            error!("failed to update date index with {date}: {err}");
            AppError::from(err)
        })?;

    info!(date = %date, new_date = indexed, "stored report");
    Ok(date)
}

/// The report for `date`, or the latest one when no date is given.
pub async fn fetch(store: &KvStore, date: Option<&str>) -> Result<Value, AppError> {
    let key = match date.filter(|date| !date.is_empty()) {
        Some(date) if is_calendar_date(date) => dated_key(date),
        Some(_) => return Err(AppError::not_found()),
        None => LATEST_KEY.to_string(),
    };

    let report: Option<Value> = store.get(&key).await.map_err(|err| {
        error!("failed to read {key}: {err}");
        AppError::from(err)
    })?;
    report.ok_or_else(AppError::not_found)
}

pub async fn list_dates(store: &KvStore) -> Result<Vec<String>, AppError> {
    let dates: Option<Vec<String>> = store.get(DATES_KEY).await?;
    Ok(dates.unwrap_or_default())
}

fn is_calendar_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok()
}
