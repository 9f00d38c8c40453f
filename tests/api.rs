// tests/api.rs
//
// Drives the real router in-process: multipart uploads, then the report
// endpoints, including the documented 120-minute boundary scenario.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use sla_analytics_api::{build_router, store::Store, AppState};

const BOUNDARY: &str = "sla-analytics-test-boundary";

const TICKET_HEADER: &str = "Issue key,Custom field (Severity),Status,Custom field (First Response SLA Target Date),Custom field (First Response SLA Actual Date),Created,Resolved,Assignee,Custom field (Product),Custom field (CRM Company),Custom field (Reopen Count),Summary";

fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().to_path_buf()).unwrap();
    (build_router(AppState { store }), dir)
}

fn multipart_upload(uri: &str, filename: &str, csv: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn tickets_csv() -> String {
    // ACME-1 resolves exactly at its 120-minute budget (boundary equality);
    // ACME-2 takes 180 minutes (50% over); ACME-3 is still open but has
    // been reopened three times. Company spellings differ from the SLA
    // matrix on purpose.
    [
        TICKET_HEADER,
        "ACME-1,Severity 1,Permanently Closed,18/Aug/25 7:00 PM,18/Aug/25 6:30 PM,18/Aug/25 6:00 PM,18/Aug/25 8:00 PM,alice,Widget, acme ,0,Boundary ticket",
        "ACME-2,Severity 1,Permanently Closed,18/Aug/25 7:00 PM,18/Aug/25 6:45 PM,18/Aug/25 6:00 PM,18/Aug/25 9:00 PM,alice,Widget,Acme,0,Late ticket",
        "ACME-3,Severity 1,In Progress,,,18/Aug/25 6:00 PM,,bob,Widget,Acme,3,Flapping ticket",
    ]
    .join("\n")
}

fn sla_csv() -> String {
    "CRM Company,Severity 1 First Response,Severity 1 Resolution\nACME,60,120".to_string()
}

async fn upload_fixtures(app: &Router) {
    let response = app
        .clone()
        .oneshot(multipart_upload("/upload/tickets", "tickets.csv", &tickets_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = body_json(response).await;
    assert_eq!(receipt["rows_stored"], 3);
    assert_eq!(receipt["sha256"].as_str().unwrap().len(), 64);

    let response = app
        .clone()
        .oneshot(multipart_upload("/upload/sla", "sla.csv", &sla_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = body_json(response).await;
    assert_eq!(receipt["rows_stored"], 1);
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _dir) = test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn reports_require_both_uploads() {
    let (app, _dir) = test_app();

    let response = app.clone().oneshot(get("/reports/summary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Upload both tickets CSV and SLA CSV"));

    // One table alone is not enough for a consistent snapshot pair.
    let response = app
        .clone()
        .oneshot(multipart_upload("/upload/sla", "sla.csv", &sla_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.clone().oneshot(get("/reports/violations")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_required_column_rejects_the_whole_batch() {
    let (app, _dir) = test_app();

    // Tickets CSV without the "Created" column.
    let csv = "Issue key,Custom field (Severity),Status,Custom field (First Response SLA Target Date),Custom field (First Response SLA Actual Date),Resolved,Assignee,Custom field (Product),Custom field (CRM Company),Custom field (Reopen Count)\nACME-1,Severity 1,Permanently Closed,,,,alice,Widget,Acme,0";
    let response = app
        .clone()
        .oneshot(multipart_upload("/upload/tickets", "tickets.csv", csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["column"], "Created");
    assert!(body["error"].as_str().unwrap().contains("Created"));

    // Zero tickets were admitted: reports still see no ticket table.
    let response = app
        .clone()
        .oneshot(multipart_upload("/upload/sla", "sla.csv", &sla_csv()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.clone().oneshot(get("/reports/summary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_csv_upload_is_rejected() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(multipart_upload("/upload/tickets", "tickets.xlsx", "junk"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Only CSV supported");
}

#[tokio::test]
async fn end_to_end_boundary_compliance_and_reports() {
    let (app, _dir) = test_app();
    upload_fixtures(&app).await;

    // Summary: boundary ticket compliant, late ticket violated.
    let response = app.clone().oneshot(get("/reports/summary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["total_tickets"], 3);
    assert_eq!(summary["eligible_tickets"], 2);
    assert_eq!(summary["evaluable_tickets"], 2);
    assert_eq!(summary["compliant"], 1);
    assert_eq!(summary["violated"], 1);
    assert_eq!(summary["resolution_compliance_pct"], 50.0);
    assert_eq!(summary["coverage_pct"], 100.0);
    assert_eq!(summary["median_resolution_minutes"], 150.0);
    assert_eq!(summary["p90_resolution_minutes"], 174.0);
    assert_eq!(summary["by_severity"][0]["severity"], 1);
    assert_eq!(summary["by_severity"][0]["compliance_pct"], 50.0);

    // Violations: only the late ticket; the boundary ticket's equality is
    // compliant and its percent-exceeded renders as null (absent here).
    let response = app.clone().oneshot(get("/reports/violations")).await.unwrap();
    let violations = body_json(response).await;
    let rows = violations.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["issue_key"], "ACME-2");
    assert_eq!(rows[0]["resolution"], "violated");
    assert_eq!(rows[0]["resolution_percent_exceeded"], 50.0);
    assert_eq!(rows[0]["first_response"], "compliant");
    assert!(rows[0]["first_response_percent_exceeded"].is_null());

    // Reopens: independent of the closed-status gate.
    let response = app.clone().oneshot(get("/reports/reopens")).await.unwrap();
    let reopens = body_json(response).await;
    let rows = reopens.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["issue_key"], "ACME-3");
    assert_eq!(rows[0]["reopen_count"], 3);
    assert_eq!(rows[0]["status"], "In Progress");

    // Averages: only eligible, evaluable tickets contribute.
    let response = app.clone().oneshot(get("/reports/assignee_avg")).await.unwrap();
    let averages = body_json(response).await;
    let rows = averages.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["assignee"], "alice");
    assert_eq!(rows[0]["ticket_count"], 2);
    assert_eq!(rows[0]["avg_resolution_minutes"], 150.0);

    let response = app.clone().oneshot(get("/reports/product_avg")).await.unwrap();
    let products = body_json(response).await;
    assert_eq!(products.as_array().unwrap()[0]["product"], "Widget");
}

#[tokio::test]
async fn upload_replaces_the_previous_table_wholesale() {
    let (app, _dir) = test_app();
    upload_fixtures(&app).await;

    // Re-upload with a single ticket; the old three are gone.
    let csv = [
        TICKET_HEADER,
        "ACME-9,Severity 1,Permanently Closed,,,18/Aug/25 6:00 PM,18/Aug/25 7:00 PM,carol,Widget,Acme,0,Replacement",
    ]
    .join("\n");
    let response = app
        .clone()
        .oneshot(multipart_upload("/upload/tickets", "tickets.csv", &csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/reports/summary")).await.unwrap();
    let summary = body_json(response).await;
    assert_eq!(summary["total_tickets"], 1);
    assert_eq!(summary["compliant"], 1);
}
