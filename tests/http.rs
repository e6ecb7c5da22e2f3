#![cfg(feature = "server")]
//! End-to-end: the reqwest client against the axum CSV server, plus a stub
//! of the external ratio service.

use axum::{Json, Router, http::StatusCode, routing::post};
use csvgen::api::ExportApi;
use csvgen::form::QUERY_FAILURE;
use csvgen::{Config, Controller, DirectorySaver, ExportKind, HttpApi, MemorySaver, server};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn debt_to_equity(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    match body["ticker"].as_str() {
        Some("AAPL") => (
            StatusCode::OK,
            Json(json!({ "data": [{ "year": 2023, "debt_to_equity": 1.5 }] })),
        ),
        Some("NODATA") => (StatusCode::OK, Json(json!({}))),
        Some(ticker) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No balance sheet data for {ticker}") })),
        ),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "ticker is required" })),
        ),
    }
}

async fn cash_flow_csv() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Cash flow data unavailable" })),
    )
}

/// CSV server merged with a ratio service stub. `/api/debt-to-equity-csv`
/// is left unrouted so it answers 404 with an empty body.
fn backend() -> Router {
    Router::new()
        .route("/api/debt-to-equity", post(debt_to_equity))
        .route("/api/cash-flow-csv", post(cash_flow_csv))
        .merge(server::router())
}

fn api(base_url: &str) -> HttpApi {
    let config = Config::default()
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(5));
    HttpApi::new(&config).unwrap()
}

#[tokio::test]
async fn health_check_round_trip() {
    let base = spawn(backend()).await;
    let health = api(&base).health().await.unwrap();
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn table_export_writes_server_csv_to_disk() {
    let base = spawn(backend()).await;
    let dir = tempfile::tempdir().unwrap();
    let controller = Controller::new(api(&base), DirectorySaver::new(dir.path()));

    let saved = controller.submit_export(ExportKind::Generic).await.unwrap();

    let path = saved.path.unwrap();
    assert!(path.starts_with(dir.path()));
    let text = std::fs::read_to_string(path).unwrap();
    assert_eq!(
        text,
        "name,email,age\n\
         John Doe,john@example.com,30\n\
         Jane Smith,jane@example.com,25\n\
         Bob Johnson,bob@example.com,35\n"
    );
    assert!(!controller.snapshot().is_loading());
}

#[tokio::test]
async fn ratio_query_round_trip() {
    let base = spawn(backend()).await;
    let controller = Controller::new(api(&base), MemorySaver::new());
    controller.set_ticker("aapl");

    controller.submit_query().await.unwrap();

    let form = controller.snapshot();
    assert_eq!(form.error(), None);
    assert_eq!(form.ratios().len(), 1);
    assert_eq!(form.ratios()[0].year, 2023);
    assert_eq!(form.ratios()[0].debt_to_equity, 1.5);

    controller.set_ticker("zzzz");
    controller.submit_query().await.unwrap_err();

    let form = controller.snapshot();
    assert!(!form.is_loading());
    assert_eq!(form.error(), Some("No balance sheet data for ZZZZ"));
    assert_eq!(form.ratios().len(), 1);
}

#[tokio::test]
async fn ratio_response_without_data_uses_generic_message() {
    let base = spawn(backend()).await;
    let controller = Controller::new(api(&base), MemorySaver::new());
    controller.set_ticker("nodata");

    controller.submit_query().await.unwrap_err();

    let form = controller.snapshot();
    assert!(!form.is_loading());
    assert_eq!(form.error(), Some(QUERY_FAILURE));
    assert!(form.ratios().is_empty());
}

#[tokio::test]
async fn server_error_body_reaches_the_form() {
    let base = spawn(backend()).await;
    let controller = Controller::new(api(&base), MemorySaver::new());
    controller.set_ticker("aapl");

    controller
        .submit_export(ExportKind::CashFlow)
        .await
        .unwrap_err();

    assert_eq!(
        controller.snapshot().error(),
        Some("Cash flow data unavailable")
    );
}

#[tokio::test]
async fn empty_error_response_falls_back_to_generic_message() {
    let base = spawn(backend()).await;
    let controller = Controller::new(api(&base), MemorySaver::new());
    controller.set_ticker("aapl");

    controller
        .submit_export(ExportKind::DebtToEquity)
        .await
        .unwrap_err();

    let form = controller.snapshot();
    assert!(!form.is_loading());
    assert_eq!(
        form.error(),
        Some(ExportKind::DebtToEquity.failure_message())
    );
    assert!(controller.saver().files().is_empty());
}

#[tokio::test]
async fn unreachable_backend_uses_generic_message() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let controller = Controller::new(api(&format!("http://{addr}")), MemorySaver::new());

    assert!(!controller.backend_ready().await);
    controller
        .submit_export(ExportKind::Generic)
        .await
        .unwrap_err();

    let form = controller.snapshot();
    assert!(!form.is_loading());
    assert_eq!(form.error(), Some("Failed to generate CSV. Please try again."));
}
