//! CSV export endpoints
//!
//! Each request reads the whole table and renders it in one piece. A read
//! failure produces no file at all.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use dvt_common::export::{to_delimited, ExportError};
use dvt_common::store::StoreResult;
use dvt_common::Record;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// One exportable table
#[derive(Debug, Clone, Copy)]
struct Export {
    filename: &'static str,
    failure: &'static str,
}

const ONBOARDING: Export = Export {
    filename: "onboarding.csv",
    failure: "Failed to export onboarding data",
};

const SURVEYS: Export = Export {
    filename: "surveys.csv",
    failure: "Failed to export surveys",
};

/// GET /api/export/onboarding.csv
pub async fn export_onboarding(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.store.get_all_onboarding().await;
    render(&state, ONBOARDING, records).await
}

/// GET /api/export/surveys.csv
pub async fn export_surveys(State(state): State<AppState>) -> ApiResult<Response> {
    let records = state.store.get_all_surveys().await;
    render(&state, SURVEYS, records).await
}

async fn render(
    state: &AppState,
    export: Export,
    records: StoreResult<Vec<Record>>,
) -> ApiResult<Response> {
    let records = match records {
        Ok(records) => records,
        Err(e) => {
            error!(file = export.filename, error = %e, "{}", export.failure);
            *state.last_error.write().await = Some(format!("{}: {}", export.failure, e));
            return Err(ApiError::ExportFailed(export.failure.to_string()));
        }
    };

    let csv = to_delimited(&records).map_err(|e| match e {
        ExportError::NoData => ApiError::NoData(e.to_string()),
    })?;
    info!(file = export.filename, rows = records.len(), "Export generated");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        csv,
    )
        .into_response())
}
