//! Calendar-period counts per country.
//!
//! Periods are half-open `[first instant, first instant of the next period)`
//! in UTC, so a sale stamped exactly at midnight on the first of the next
//! month belongs to the next month only. Counting the twelve months of a year
//! therefore always adds up to the year count.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, NaiveDate, Utc};
use sales_analytics_storage::{Where, filter::Field, model::DATE_YEARS};

use crate::{bad_request, error::ApiError, state::AppState};

fn first_instant(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)
        .map(|start| start.and_utc())
}

fn out_of_range(year: i32) -> ApiError {
    bad_request!(
        "year must be between {} and {}, got {}",
        DATE_YEARS.start(),
        DATE_YEARS.end() - 1,
        year
    )
}

/// A period's exclusive upper bound must itself be a storable date, so the
/// last storable year cannot be queried.
fn check_year(year: i32) -> Result<i32, ApiError> {
    if *DATE_YEARS.start() <= year && year < *DATE_YEARS.end() {
        Ok(year)
    } else {
        Err(out_of_range(year))
    }
}

/// Bounds of calendar month `month` (1-12) of `year`.
pub fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    if !(1..=12).contains(&month) {
        return Err(bad_request!("month must be between 1 and 12, got {}", month));
    }

    let year = check_year(year)?;
    let start = first_instant(year, month).ok_or_else(|| out_of_range(year))?;
    let end = if month == 12 {
        year.checked_add(1).and_then(|next| first_instant(next, 1))
    } else {
        first_instant(year, month + 1)
    }
    .ok_or_else(|| out_of_range(year))?;

    Ok((start, end))
}

/// Bounds of calendar year `year`.
pub fn year_bounds(year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let year = check_year(year)?;
    let start = first_instant(year, 1).ok_or_else(|| out_of_range(year))?;
    let end = year
        .checked_add(1)
        .and_then(|next| first_instant(next, 1))
        .ok_or_else(|| out_of_range(year))?;
    Ok((start, end))
}

fn parse_year(raw: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| bad_request!("year must be an integer, got `{}`", raw))
}

fn parse_month(raw: &str) -> Result<u32, ApiError> {
    raw.parse()
        .map_err(|_| bad_request!("month must be an integer, got `{}`", raw))
}

async fn count_in_period(
    state: &AppState,
    country: String,
    (start, end): (DateTime<Utc>, DateTime<Utc>),
) -> Result<u64, ApiError> {
    let where_clause =
        Where::eq(Field::Country, country).and(Where::between(Field::Date, start, end));
    Ok(state.store.count(Some(&where_clause)).await?)
}

/// GET /sales/analytics/{country}/{year}/{month}
#[tracing::instrument(name = "GET /sales/analytics/{country}/{year}/{month}", skip(state))]
pub async fn count_for_month(
    State(state): State<AppState>,
    Path((country, year, month)): Path<(String, String, String)>,
) -> Result<Json<u64>, ApiError> {
    let bounds = month_bounds(parse_year(&year)?, parse_month(&month)?)?;
    let count = count_in_period(&state, country, bounds).await?;
    Ok(Json(count))
}

/// GET /sales/analytics/{country}/{year}
#[tracing::instrument(name = "GET /sales/analytics/{country}/{year}", skip(state))]
pub async fn count_for_year(
    State(state): State<AppState>,
    Path((country, year)): Path<(String, String)>,
) -> Result<Json<u64>, ApiError> {
    let bounds = year_bounds(parse_year(&year)?)?;
    let count = count_in_period(&state, country, bounds).await?;
    Ok(Json(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::TimeZone;

    #[test]
    fn month_bounds_are_first_instants() {
        let (start, end) = month_bounds(2019, 1).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2019, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (start, end) = month_bounds(2019, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2019, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn year_bounds_cover_the_calendar_year() {
        let (start, end) = year_bounds(2020).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn months_tile_the_year() {
        let (year_start, year_end) = year_bounds(2024).unwrap();
        let mut cursor = year_start;
        for month in 1..=12 {
            let (start, end) = month_bounds(2024, month).unwrap();
            assert_eq!(start, cursor);
            cursor = end;
        }
        assert_eq!(cursor, year_end);
    }

    #[test]
    fn last_queryable_year_stays_storable() {
        let (_, end) = month_bounds(9998, 12).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(9999, 1, 1, 0, 0, 0).unwrap());
        assert!(year_bounds(0).is_ok());
    }

    #[test]
    fn rejects_bad_months_and_years() {
        for month in [0, 13] {
            assert_eq!(
                month_bounds(2019, month).unwrap_err().status(),
                StatusCode::BAD_REQUEST
            );
        }
        assert_eq!(
            year_bounds(i32::MAX).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
        for year in [-1, 9999, 10000] {
            assert_eq!(
                year_bounds(year).unwrap_err().status(),
                StatusCode::BAD_REQUEST
            );
            assert_eq!(
                month_bounds(year, 12).unwrap_err().status(),
                StatusCode::BAD_REQUEST
            );
        }
        assert!(parse_year("twenty").is_err());
        assert!(parse_month("1.5").is_err());
    }
}
