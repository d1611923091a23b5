use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};

use crate::AppState;

const CSV_FIELD: &str = "csv";

pub async fn sync(State(state): State<AppState>) -> Response {
    match state.sync.run().await {
        Ok(report) => {
            tracing::info!(%report, "Sync finished");
            (StatusCode::OK, "Successfully synced!").into_response()
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Sync failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Sync failed: {e:#}")).into_response()
        }
    }
}

async fn read_csv_field(mut multipart: Multipart) -> Result<Option<String>, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse multipart form");
                return Err((StatusCode::BAD_REQUEST, "Error parsing form").into_response());
            }
        };
        if field.name() != Some(CSV_FIELD) {
            continue;
        }
        return match field.text().await {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read uploaded CSV");
                Err((StatusCode::BAD_REQUEST, "Error parsing form").into_response())
            }
        };
    }
}

pub async fn upload_csv(State(state): State<AppState>, method: Method, request: Request) -> Response {
    if method != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
    }

    let multipart = match Multipart::from_request(request, &state).await {
        Ok(multipart) => multipart,
        Err(e) => {
            tracing::warn!(error = %e, "Upload is not a multipart form");
            return (StatusCode::BAD_REQUEST, "Error parsing form").into_response();
        }
    };

    let content = match read_csv_field(multipart).await {
        Ok(Some(content)) => content,
        Ok(None) => return (StatusCode::BAD_REQUEST, "No CSV file provided").into_response(),
        Err(response) => return response,
    };

    match state.sync.import_csv(&content).await {
        Ok(report) => {
            tracing::info!(
                submitted = report.submitted,
                created = report.created,
                duplicates = report.duplicate_import_ids.len(),
                "Statement imported"
            );
            (StatusCode::OK, report.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Error processing CSV");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error processing CSV file").into_response()
        }
    }
}
