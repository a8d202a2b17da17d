use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use std::sync::Arc;

use crate::api::{Envelope, EnvelopeError};
use crate::models::{ConsolidationFn, RrdPoint, Timeframe};
use crate::version::VERSION;
use crate::view::PageScope;
use crate::web::AppState;
use crate::web::context::session_token;
use crate::web::forms::{IdPath, RrdQuery};

pub async fn health_check_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": VERSION }))
}

fn parse_or_default<T: std::str::FromStr<Err = String> + Default>(
    value: Option<&str>,
) -> Result<T, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(value) => value.parse(),
    }
}

fn invalid_query(detail: String) -> (StatusCode, Json<Envelope<Vec<RrdPoint>>>) {
    let envelope = Envelope {
        message: detail.clone(),
        data: None,
        error: Some(EnvelopeError {
            code: "INVALID_INPUT",
            detail,
        }),
    };
    (StatusCode::BAD_REQUEST, Json(envelope))
}

/// Metrics series for the chart on the VPS page, wrapped in an envelope.
#[axum::debug_handler]
pub async fn vps_rrd_handler(
    State(app_state): State<Arc<AppState>>,
    Path(path): Path<IdPath>,
    jar: CookieJar,
    Query(query): Query<RrdQuery>,
) -> (StatusCode, Json<Envelope<Vec<RrdPoint>>>) {
    let timeframe: Timeframe = match parse_or_default(query.timeframe.as_deref()) {
        Ok(timeframe) => timeframe,
        Err(detail) => return invalid_query(detail),
    };
    let cf: ConsolidationFn = match parse_or_default(query.cf.as_deref()) {
        Ok(cf) => cf,
        Err(detail) => return invalid_query(detail),
    };

    let token = session_token(&jar, &app_state.config.session_key);
    let scope = PageScope::new();
    let result = app_state
        .vps
        .get_rrd(token.as_deref(), path.id, timeframe, cf, scope.token())
        .await;

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(err) => err.http_status(),
    };
    (status, Json(Envelope::from_result("Metrics loaded", result)))
}
