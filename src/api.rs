// 🌐 HTTP API - JSON endpoints over the shared SQLite connection
//
// Routes live under /api; the binary in bin/server.rs only wires settings,
// logging and the listener around `create_app`.

use crate::config::Settings;
use crate::daily::DailyRecordDraft;
use crate::db::{self, RecordKind};
use crate::entities::{BankAccountInfo, ClientInfo, CompanyInfo};
use crate::estimate::EstimateDraft;
use crate::export;
use crate::format::{parse_grouped, Amount};
use crate::preview;
use crate::schema::{self, ValidationError};
use anyhow::anyhow;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, HeaderValue, Request, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub const X_REQUEST_ID: &str = "x-request-id";

// ============================================================================
// STATE
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(conn: Connection, settings: Settings) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
            settings: Arc::new(settings),
        }
    }

    fn conn(&self) -> ApiResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal(anyhow!("database lock poisoned")))
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {}", schema::describe(.0))]
    Validation(Vec<ValidationError>),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Validation(errors) => schema::describe(errors),
            // Don't leak internal error details
            Self::Internal(_) => "서버 오류가 발생했습니다.".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => tracing::error!(error = ?e, "Internal server error"),
            _ => tracing::warn!(error = %self, "API error"),
        }

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.public_message(),
            errors: match self {
                Self::Validation(errors) => Some(errors),
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<Vec<ValidationError>> for ApiError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ApiError::Validation(errors)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// RESPONSE BODIES
// ============================================================================

#[derive(Serialize)]
struct Created {
    id: i64,
    message: &'static str,
}

#[derive(Serialize)]
struct SavedEstimate {
    id: i64,
    estimate_number: String,
    total: Amount,
    message: &'static str,
}

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
}

#[derive(Serialize)]
struct FormattedAmount {
    amount: u64,
    grouped: String,
    won: String,
    korean: String,
}

#[derive(Serialize)]
struct NextNumber {
    estimate_number: String,
}

#[derive(Deserialize)]
struct NextNumberParams {
    date: Option<String>,
}

#[derive(Deserialize)]
struct BulkDeleteRequest {
    kind: RecordKind,
    ids: Vec<i64>,
}

#[derive(Serialize)]
struct BulkDeleteResponse {
    deleted: usize,
}

fn deleted_or_not_found(deleted: bool, ok: &'static str, missing: &str) -> ApiResult<Json<Message>> {
    if deleted {
        Ok(Json(Message { message: ok }))
    } else {
        Err(ApiError::NotFound(missing.to_string()))
    }
}

// ============================================================================
// HANDLERS - health & formatting
// ============================================================================

/// GET /api/health
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let conn = state.conn()?;
    let database = match conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
        Ok(_) => "ok",
        Err(_) => "error",
    };

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
        database,
    }))
}

/// GET /api/format/:amount - "1,485,000" or "1485000"
async fn format_amount(Path(raw): Path<String>) -> ApiResult<Json<FormattedAmount>> {
    let value = parse_grouped(&raw)
        .ok_or_else(|| ApiError::BadRequest(format!("금액 형식이 올바르지 않습니다: {}", raw)))?;
    let amount = Amount::new(value);

    Ok(Json(FormattedAmount {
        amount: value,
        grouped: amount.grouped(),
        won: amount.won(),
        korean: amount.korean_words(),
    }))
}

// ============================================================================
// HANDLERS - directory
// ============================================================================

async fn list_companies(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let conn = state.conn()?;
    Ok(Json(db::list_companies(&conn)?))
}

async fn create_company(
    State(state): State<AppState>,
    Json(info): Json<CompanyInfo>,
) -> ApiResult<impl IntoResponse> {
    let info = info.normalized();
    schema::validate_company(&info)?;

    let conn = state.conn()?;
    let id = db::insert_company(&conn, &info)?;
    Ok((StatusCode::CREATED, Json(Created { id, message: "회사 정보가 저장되었습니다." })))
}

async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Message>> {
    let conn = state.conn()?;
    deleted_or_not_found(
        db::delete_company(&conn, id)?,
        "회사 정보가 삭제되었습니다.",
        "회사 정보를 찾을 수 없습니다.",
    )
}

async fn list_clients(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let conn = state.conn()?;
    Ok(Json(db::list_clients(&conn)?))
}

async fn create_client(
    State(state): State<AppState>,
    Json(info): Json<ClientInfo>,
) -> ApiResult<impl IntoResponse> {
    let info = info.normalized();
    schema::validate_client(&info)?;

    let conn = state.conn()?;
    let id = db::insert_client(&conn, &info)?;
    Ok((StatusCode::CREATED, Json(Created { id, message: "고객 정보가 저장되었습니다." })))
}

async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Message>> {
    let conn = state.conn()?;
    deleted_or_not_found(
        db::delete_client(&conn, id)?,
        "고객 정보가 삭제되었습니다.",
        "고객 정보를 찾을 수 없습니다.",
    )
}

async fn list_bank_accounts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let conn = state.conn()?;
    Ok(Json(db::list_bank_accounts(&conn)?))
}

async fn create_bank_account(
    State(state): State<AppState>,
    Json(info): Json<BankAccountInfo>,
) -> ApiResult<impl IntoResponse> {
    schema::validate_bank_account(&info)?;

    let conn = state.conn()?;
    let id = db::insert_bank_account(&conn, &info)?;
    Ok((StatusCode::CREATED, Json(Created { id, message: "계좌 정보가 저장되었습니다." })))
}

async fn delete_bank_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Message>> {
    let conn = state.conn()?;
    deleted_or_not_found(
        db::delete_bank_account(&conn, id)?,
        "계좌 정보가 삭제되었습니다.",
        "계좌 정보를 찾을 수 없습니다.",
    )
}

// ============================================================================
// HANDLERS - estimates
// ============================================================================

const ESTIMATE_NOT_FOUND: &str = "견적서를 찾을 수 없습니다.";

async fn list_estimates(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let conn = state.conn()?;
    Ok(Json(db::list_estimates(&conn)?))
}

async fn create_estimate(
    State(state): State<AppState>,
    Json(draft): Json<EstimateDraft>,
) -> ApiResult<impl IntoResponse> {
    let document = draft.normalized().into_document(state.settings.validity_months)?;

    let mut conn = state.conn()?;
    let id = db::save_estimate(&mut conn, &document)?;
    let saved = db::get_estimate(&conn, id)?
        .ok_or_else(|| ApiError::Internal(anyhow!("estimate {} vanished after save", id)))?;

    Ok((
        StatusCode::CREATED,
        Json(SavedEstimate {
            id,
            estimate_number: saved.document.estimate_number,
            total: saved.document.totals.total,
            message: "견적서가 저장되었습니다.",
        }),
    ))
}

async fn get_estimate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.conn()?;
    let estimate = db::get_estimate(&conn, id)?
        .ok_or_else(|| ApiError::NotFound(ESTIMATE_NOT_FOUND.to_string()))?;
    Ok(Json(estimate))
}

async fn delete_estimate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Message>> {
    let conn = state.conn()?;
    deleted_or_not_found(
        db::delete_estimate(&conn, id)?,
        "견적서가 삭제되었습니다.",
        ESTIMATE_NOT_FOUND,
    )
}

async fn preview_estimate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Html<String>> {
    let conn = state.conn()?;
    let estimate = db::get_estimate(&conn, id)?
        .ok_or_else(|| ApiError::NotFound(ESTIMATE_NOT_FOUND.to_string()))?;
    Ok(Html(preview::render_estimate_html(&estimate.document)))
}

/// GET /api/estimates/next_number?date=YYYY-MM-DD (default today)
async fn next_number(
    State(state): State<AppState>,
    Query(params): Query<NextNumberParams>,
) -> ApiResult<Json<NextNumber>> {
    let date = match params.date.as_deref().map(str::trim) {
        None | Some("") => Local::now().date_naive(),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest(format!("날짜 형식이 올바르지 않습니다: {}", raw)))?,
    };

    let conn = state.conn()?;
    Ok(Json(NextNumber {
        estimate_number: db::next_number_for(&conn, date)?,
    }))
}

// ============================================================================
// HANDLERS - daily records
// ============================================================================

const DAILY_NOT_FOUND: &str = "영수증 기록을 찾을 수 없습니다.";

async fn list_daily_records(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let conn = state.conn()?;
    Ok(Json(db::list_daily_records(&conn)?))
}

async fn create_daily_record(
    State(state): State<AppState>,
    Json(draft): Json<DailyRecordDraft>,
) -> ApiResult<impl IntoResponse> {
    let sheet = draft.into_sheet()?;

    let conn = state.conn()?;
    let id = db::save_daily_record(&conn, &sheet)?;
    Ok((StatusCode::CREATED, Json(Created { id, message: "영수증 기록이 저장되었습니다." })))
}

async fn get_daily_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.conn()?;
    let record = db::get_daily_record(&conn, id)?
        .ok_or_else(|| ApiError::NotFound(DAILY_NOT_FOUND.to_string()))?;
    Ok(Json(record))
}

async fn delete_daily_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Message>> {
    let conn = state.conn()?;
    deleted_or_not_found(
        db::delete_daily_record(&conn, id)?,
        "영수증 기록이 삭제되었습니다.",
        DAILY_NOT_FOUND,
    )
}

async fn preview_daily_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Html<String>> {
    let conn = state.conn()?;
    let record = db::get_daily_record(&conn, id)?
        .ok_or_else(|| ApiError::NotFound(DAILY_NOT_FOUND.to_string()))?;
    Ok(Html(preview::render_daily_html(&record.sheet)))
}

// ============================================================================
// HANDLERS - export & bulk
// ============================================================================

/// CSV download; the Korean file name goes in the RFC 5987 `filename*` form
fn csv_attachment(file_name: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    );

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

async fn export_estimate_csv(
    State(state): State<AppState>,
    Json(draft): Json<EstimateDraft>,
) -> ApiResult<Response> {
    let document = draft.normalized().into_document(state.settings.validity_months)?;
    let bytes = export::estimate_sheet_csv(&document)?;
    Ok(csv_attachment(&export::estimate_file_name(&document), bytes))
}

async fn export_daily_csv(Json(draft): Json<DailyRecordDraft>) -> ApiResult<Response> {
    let sheet = draft.into_sheet()?;
    let bytes = export::daily_sheet_csv(&sheet)?;
    Ok(csv_attachment(&export::daily_file_name(&sheet), bytes))
}

async fn bulk_delete(
    State(state): State<AppState>,
    Json(request): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    if request.ids.is_empty() {
        return Err(ApiError::BadRequest("삭제할 항목을 선택해주세요.".to_string()));
    }

    let mut conn = state.conn()?;
    let deleted = db::delete_records(&mut conn, request.kind, &request.ids)?;
    Ok(Json(BulkDeleteResponse { deleted }))
}

// ============================================================================
// ROUTER
// ============================================================================

/// UUID v4 request ids
#[derive(Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/format/:amount", get(format_amount))
        .route("/companies", get(list_companies).post(create_company))
        .route("/companies/:id", delete(delete_company))
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/:id", delete(delete_client))
        .route("/bank_accounts", get(list_bank_accounts).post(create_bank_account))
        .route("/bank_accounts/:id", delete(delete_bank_account))
        .route("/estimates", get(list_estimates).post(create_estimate))
        .route("/estimates/next_number", get(next_number))
        .route("/estimates/:id", get(get_estimate).delete(delete_estimate))
        .route("/estimates/:id/preview", get(preview_estimate))
        .route("/daily_records", get(list_daily_records).post(create_daily_record))
        .route("/daily_records/:id", get(get_daily_record).delete(delete_daily_record))
        .route("/daily_records/:id/preview", get(preview_daily_record))
        .route("/export_estimate_csv", post(export_estimate_csv))
        .route("/export_daily_csv", post(export_daily_csv))
        .route("/records/bulk_delete", post(bulk_delete))
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Full application: /api routes plus request id, tracing and CORS middleware
pub fn create_app(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static(X_REQUEST_ID);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id_header.clone(), UuidRequestId))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(build_cors_layer(&state.settings));

    Router::new()
        .nest("/api", api_router())
        .layer(middleware)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        create_app(AppState::new(conn, Settings::default()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn estimate_body() -> Value {
        json!({
            "estimate_number": "",
            "estimate_date": "2024-03-05",
            "valid_until": "",
            "company": {"name": "한빛인테리어", "business_number": "1234567890", "phone": "0212345678"},
            "client": {"type": "individual", "name": "김철수", "contact": "010-1234-5678"},
            "items": [
                {"category": "도배", "name": "실크벽지", "spec": "LG", "unit": "롤", "quantity": 30, "price": 15000},
                {"category": "바닥", "name": "강마루", "quantity": 20, "price": 45000},
                {"name": "", "quantity": 1, "price": 0}
            ]
        })
    }

    #[tokio::test]
    async fn test_health_has_request_id() {
        let app = test_app();
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_format_endpoint() {
        let app = test_app();

        let (status, body) = send_json(&app, "GET", "/api/format/1,485,000", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["grouped"], "1,485,000");
        assert_eq!(body["korean"], "백사십팔만오천원 正");

        let (status, body) = send_json(&app, "GET", "/api/format/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_estimate_lifecycle() {
        let app = test_app();

        let (status, created) = send_json(&app, "POST", "/api/estimates", Some(estimate_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["estimate_number"], "240305-001");
        assert_eq!(created["total"], 1_485_000);
        let id = created["id"].as_i64().unwrap();

        let (status, list) = send_json(&app, "GET", "/api/estimates", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["client_name"], "김철수");
        assert_eq!(list[0]["total_amount"], 1_485_000);

        let (_, estimate) = send_json(&app, "GET", &format!("/api/estimates/{}", id), None).await;
        assert_eq!(estimate["company"]["business_number"], "123-45-67890");
        assert_eq!(estimate["company"]["phone"], "02-1234-5678");
        assert_eq!(estimate["items"].as_array().unwrap().len(), 2);

        let (_, next) = send_json(&app, "GET", "/api/estimates/next_number?date=2024-03-05", None).await;
        assert_eq!(next["estimate_number"], "240305-002");

        let (status, html) = send(&app, "GET", &format!("/api/estimates/{}/preview", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(html).unwrap().contains("백사십팔만오천원 正"));

        let (status, _) = send_json(&app, "DELETE", &format!("/api/estimates/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_json(&app, "GET", &format!("/api/estimates/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], ESTIMATE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_estimate_rejected() {
        let app = test_app();
        let mut body = estimate_body();
        body["items"] = json!([]);
        body["client"]["contact"] = json!("");

        let (status, response) = send_json(&app, "POST", "/api/estimates", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["code"], "VALIDATION_ERROR");

        let fields: Vec<&str> = response["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"client.phone"));
        assert!(fields.contains(&"items"));
    }

    #[tokio::test]
    async fn test_daily_records_and_bulk_delete() {
        let app = test_app();
        let body = json!({
            "daily_date": "2024-03-05",
            "site_name": "강남 아파트",
            "items": [{"category": "자재비", "content": "타일 본드", "rate": 35000}]
        });

        let mut ids = Vec::new();
        for _ in 0..2 {
            let (status, created) = send_json(&app, "POST", "/api/daily_records", Some(body.clone())).await;
            assert_eq!(status, StatusCode::CREATED);
            ids.push(created["id"].as_i64().unwrap());
        }

        let (_, list) = send_json(&app, "GET", "/api/daily_records", None).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
        assert_eq!(list[0]["daily_date"], "2024-03-05");
        assert_eq!(list[0]["total_amount"], 35_000);

        // Detail uses the same keys as the list rows
        let (status, detail) =
            send_json(&app, "GET", &format!("/api/daily_records/{}", ids[0]), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["daily_date"], "2024-03-05");
        assert_eq!(detail["total_amount"], 35_000);
        assert!(detail.get("date").is_none());

        let (status, result) = send_json(
            &app,
            "POST",
            "/api/records/bulk_delete",
            Some(json!({"kind": "daily", "ids": ids})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["deleted"], 2);
    }

    #[tokio::test]
    async fn test_export_estimate_csv_headers() {
        let app = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/export_estimate_csv")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(estimate_body().to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename*=UTF-8''2024-03-05_"));
        assert!(disposition.ends_with(".csv"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    }

    #[tokio::test]
    async fn test_directory_endpoints() {
        let app = test_app();

        let (status, created) = send_json(
            &app,
            "POST",
            "/api/bank_accounts",
            Some(json!({"bank_name": "국민은행", "account_number": "123-456", "account_holder": "한빛"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();

        let (status, _) = send_json(&app, "POST", "/api/bank_accounts", Some(json!({"bank_name": "국민은행"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_json(&app, "DELETE", &format!("/api/bank_accounts/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send_json(&app, "DELETE", &format!("/api/bank_accounts/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send_json(&app, "POST", "/api/clients", Some(json!({"type": "individual", "name": "박민수", "contact": "01098765432"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, clients) = send_json(&app, "GET", "/api/clients", None).await;
        assert_eq!(clients[0]["phone"], "010-9876-5432");
        assert_eq!(clients[0]["type"], "individual");
    }
}
