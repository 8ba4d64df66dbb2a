//! Drives the full router against an in-memory store, and against SQLite
//! where the backend's own encoding matters.
//!
//! Run: cargo test --package sales-analytics-api --test sales_routes

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use sales_analytics_api::{construct_router, state::State};
use sales_analytics_storage::{DatabaseSalesStore, MemorySalesStore};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    construct_router(Arc::new(State::new(Arc::new(MemorySalesStore::new()))))
}

async fn sqlite_app() -> Router {
    let store = DatabaseSalesStore::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory SQLite");
    store.ensure_schema().await.expect("Failed to create schema");
    construct_router(Arc::new(State::new(Arc::new(store))))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, country: &str, date: &str, total: f64) -> Value {
    let (status, created) = send(
        app,
        Method::POST,
        "/sales",
        Some(json!({ "country": country, "date": date, "total": total })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    created
}

fn with_where(path: &str, clause: Value) -> String {
    format!("{path}?where={}", urlencoding::encode(&clause.to_string()))
}

#[tokio::test]
async fn analytics_counts_per_month_and_year() {
    let app = app();
    create(&app, "Canada", "2019-01-01", 10.0).await;
    create(&app, "Canada", "2019-01-31T23:59:59Z", 20.0).await;
    create(&app, "Canada", "2019-02-01", 30.0).await;
    create(&app, "US", "2019-01-10", 40.0).await;
    create(&app, "Canada", "2020-01-01", 50.0).await;

    let (status, january) = send(&app, Method::GET, "/sales/analytics/Canada/2019/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(january, json!(2));

    let (_, february) = send(&app, Method::GET, "/sales/analytics/Canada/2019/2", None).await;
    assert_eq!(february, json!(1));

    let (_, year) = send(&app, Method::GET, "/sales/analytics/Canada/2019", None).await;
    assert_eq!(year, json!(3));

    let (_, us) = send(&app, Method::GET, "/sales/analytics/US/2019/1", None).await;
    assert_eq!(us, json!(1));
}

#[tokio::test]
async fn month_counts_add_up_to_year_count() {
    let app = app();
    for date in [
        "2021-01-01T00:00:00Z",
        "2021-03-31T23:59:59.999Z",
        "2021-04-01",
        "2021-07-15",
        "2021-12-31T23:59:59Z",
        "2022-01-01",
        "2020-12-31T23:59:59Z",
    ] {
        create(&app, "Mexico", date, 1.0).await;
    }

    let mut sum = 0;
    for month in 1..=12 {
        let (status, count) = send(
            &app,
            Method::GET,
            &format!("/sales/analytics/Mexico/2021/{month}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        sum += count.as_u64().unwrap();
    }

    let (_, year) = send(&app, Method::GET, "/sales/analytics/Mexico/2021", None).await;
    assert_eq!(year.as_u64().unwrap(), sum);
    assert_eq!(sum, 5);
}

#[tokio::test]
async fn invalid_month_is_a_bad_request() {
    let app = app();
    for uri in [
        "/sales/analytics/Canada/2019/13",
        "/sales/analytics/Canada/2019/0",
        "/sales/analytics/Canada/twenty/1",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn crud_round_trip() {
    let app = app();
    let created = send(
        &app,
        Method::POST,
        "/sales",
        Some(json!({
            "description": "first",
            "date": "2019-01-01",
            "country": "Canada",
            "total": 100
        })),
    )
    .await
    .1;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["description"], "first");
    assert_eq!(created["total"], json!(100.0));

    let (status, fetched) = send(&app, Method::GET, &format!("/sales/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/sales/{id}"),
        Some(json!({ "total": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, patched) = send(&app, Method::GET, &format!("/sales/{id}"), None).await;
    assert_eq!(patched["total"], json!(5.0));
    assert_eq!(patched["country"], "Canada");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/sales/{id}"),
        Some(json!({ "id": id, "date": "2020-06-01", "country": "France", "total": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, replaced) = send(&app, Method::GET, &format!("/sales/{id}"), None).await;
    assert_eq!(replaced["country"], "France");
    assert_eq!(replaced["description"], Value::Null);

    let (status, _) = send(&app, Method::DELETE, &format!("/sales/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::GET, &format!("/sales/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let app = app();
    for (method, body) in [
        (Method::GET, None),
        (Method::PATCH, Some(json!({ "total": 1 }))),
        (
            Method::PUT,
            Some(json!({ "date": "2019-01-01", "country": "US", "total": 1 })),
        ),
        (Method::DELETE, None),
    ] {
        let (status, _) = send(&app, method.clone(), "/sales/42", body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
    }
}

#[tokio::test]
async fn invalid_bodies_are_rejected() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/sales", Some(json!({ "total": "lots" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("`date` is required"), "{message}");
    assert!(message.contains("`country` is required"), "{message}");
    assert!(message.contains("`total` must be a number"), "{message}");

    let (status, _) = send(
        &app,
        Method::POST,
        "/sales",
        Some(json!({ "id": 7, "date": "2019-01-01", "country": "US", "total": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/sales")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/sales/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_update_touches_only_matching_records() {
    let app = app();
    for (country, total) in [("US", 1.0), ("Canada", 2.0), ("US", 3.0), ("US", 4.0)] {
        create(&app, country, "2019-05-05", total).await;
    }

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &with_where("/sales", json!({ "country": "US" })),
        Some(json!({ "total": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated, json!({ "count": 3 }));

    let (_, zeroed) = send(
        &app,
        Method::GET,
        &with_where("/sales/count", json!({ "total": 0 })),
        None,
    )
    .await;
    assert_eq!(zeroed, json!({ "count": 3 }));

    let (_, canada) = send(
        &app,
        Method::GET,
        &format!(
            "/sales?filter={}",
            urlencoding::encode(&json!({ "where": { "country": "Canada" } }).to_string())
        ),
        None,
    )
    .await;
    assert_eq!(canada[0]["total"], json!(2.0));
}

#[tokio::test]
async fn list_honours_order_limit_and_skip() {
    let app = app();
    for (date, total) in [("2019-03-01", 3.0), ("2019-01-01", 1.0), ("2019-02-01", 2.0)] {
        create(&app, "Germany", date, total).await;
    }

    let filter = json!({ "order": "date DESC", "limit": 2, "skip": 1 });
    let (status, page) = send(
        &app,
        Method::GET,
        &format!("/sales?filter={}", urlencoding::encode(&filter.to_string())),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let totals: Vec<f64> = page
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["total"].as_f64().unwrap())
        .collect();
    assert_eq!(totals, vec![2.0, 1.0]);

    let (_, count) = send(&app, Method::GET, "/sales/count", None).await;
    assert_eq!(count, json!({ "count": 3 }));
}

#[tokio::test]
async fn malformed_where_is_a_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::GET,
        &with_where("/sales/count", json!({ "colour": "red" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = send(&app, Method::GET, "/sales/count?where=%7Bbroken", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ping_and_health_respond() {
    let app = app();

    let (status, ping) = send(&app, Method::GET, "/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ping["url"], "/ping");
    assert!(ping["greeting"].is_string());

    let (status, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");

    let (status, db) = send(&app, Method::GET, "/health/db", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(db["rtt"].is_u64());
}

#[tokio::test]
async fn oversized_limit_or_skip_is_a_bad_request() {
    for app in [app(), sqlite_app().await] {
        create(&app, "US", "2019-01-01", 1.0).await;

        for filter in [
            r#"{"limit": 9223372036854775808}"#,
            r#"{"limit": 18446744073709551615}"#,
            r#"{"skip": 9223372036854775808}"#,
        ] {
            let (status, body) = send(
                &app,
                Method::GET,
                &format!("/sales?filter={}", urlencoding::encode(filter)),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{filter}");
            assert_eq!(body["error"]["code"], "BAD_REQUEST");
        }

        let (status, page) = send(
            &app,
            Method::GET,
            &format!(
                "/sales?filter={}",
                urlencoding::encode(r#"{"limit": 9223372036854775807}"#)
            ),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page.as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn analytics_years_stay_within_storable_dates() {
    for app in [app(), sqlite_app().await] {
        create(&app, "US", "9998-12-15", 1.0).await;
        create(&app, "US", "9998-12-31T23:59:59Z", 1.0).await;

        let (status, december) = send(&app, Method::GET, "/sales/analytics/US/9998/12", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(december, json!(2));

        let (_, year) = send(&app, Method::GET, "/sales/analytics/US/9998", None).await;
        assert_eq!(year, json!(2));

        for uri in [
            "/sales/analytics/US/9999",
            "/sales/analytics/US/9999/12",
            "/sales/analytics/US/10000/1",
            "/sales/analytics/US/-1",
        ] {
            let (status, _) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }

        let (status, body) = send(
            &app,
            Method::POST,
            "/sales",
            Some(json!({ "date": "+10000-01-01", "country": "US", "total": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
