#![cfg(feature = "server")]
//! CSV backend: turns posted table rows into a CSV attachment.
//!
//! Serves `POST /api/generate-csv` and `GET /api/health`. The ratio
//! endpoints are provided by a separate service.

use axum::{
    Json, Router,
    body::{Body, Bytes},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Number of rows generated when the request carries no `rows`.
const SAMPLE_ROWS: usize = 10;

pub fn router() -> Router {
    Router::new()
        .route("/api/generate-csv", post(generate_csv))
        .route("/api/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn generate_csv(body: Bytes) -> Response {
    match build_csv(&body) {
        Ok(csv) => {
            let name = format!(
                "generated_data_{}.csv",
                Local::now().format("%Y%m%d_%H%M%S")
            );
            log::info!("generated {} ({} bytes)", name, csv.len());
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/csv")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{name}\""),
                )
                .body(Body::from(csv))
                .unwrap_or_else(|e| error_response(e.to_string()))
        }
        Err(message) => {
            log::error!("generate-csv failed: {message}");
            error_response(message)
        }
    }
}

fn error_response(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}

/// CSV for a request body. Uses `rows` when present, sample data otherwise.
fn build_csv(body: &[u8]) -> Result<Vec<u8>, String> {
    let request: Option<Value> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(serde_json::from_slice(body).map_err(|e| format!("Invalid JSON body: {e}"))?)
    };

    match request.as_ref().and_then(|r| r.get("rows")) {
        Some(rows) => rows_to_csv(rows),
        None => rows_to_csv(&sample_rows()),
    }
}

/// Ten rows of `ID, Name, Value, Date` with today's date.
fn sample_rows() -> Value {
    let today = Local::now().format("%Y-%m-%d").to_string();
    Value::Array(
        (1..=SAMPLE_ROWS)
            .map(|i| {
                json!({
                    "ID": i,
                    "Name": format!("Item {i}"),
                    "Value": i * 10,
                    "Date": today,
                })
            })
            .collect(),
    )
}

/// Serialize a JSON array of objects. Columns are the keys in order of first
/// appearance; a record without a key gets an empty cell.
fn rows_to_csv(rows: &Value) -> Result<Vec<u8>, String> {
    let records: Vec<&Map<String, Value>> = rows
        .as_array()
        .ok_or("rows must be a list")?
        .iter()
        .map(|row| row.as_object().ok_or("each row must be an object"))
        .collect::<Result<_, _>>()?;

    let mut columns: Vec<&str> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    if !columns.is_empty() {
        writer.write_record(&columns).map_err(|e| e.to_string())?;
    }
    for record in &records {
        let cells = columns
            .iter()
            .map(|column| record.get(*column).map(cell_text).unwrap_or_default());
        writer.write_record(cells).map_err(|e| e.to_string())?;
    }

    writer.into_inner().map_err(|e| e.to_string())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
