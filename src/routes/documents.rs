use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::{prelude::*, result::DatabaseErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::{Document, NewDocument};
use crate::registry::{self, ReferenceError};
use crate::schema::documents;
use crate::state::AppState;
use crate::utils::json::{classify_nullable, JsonBody, NullableValue};

const MAX_RESERVE_ATTEMPTS: u32 = 3;
const RESERVE_RETRY_DELAY: Duration = Duration::from_millis(25);

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    pub document_type: String,
    pub document_name: String,
    pub sender_name: String,
    pub receiver_name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub document_date: Option<String>,
}

#[derive(Serialize)]
pub struct CreateDocumentResponse {
    pub message: String,
    pub document_id: String,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub document_type: String,
    pub document_name: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub notes: Option<String>,
    pub action: Option<String>,
    pub status: String,
    pub document_date: Option<NaiveDate>,
    pub created_at: String,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            document_type: document.document_type,
            document_name: document.document_name,
            sender_name: document.sender_name,
            receiver_name: document.receiver_name,
            notes: document.notes,
            action: document.action,
            status: document.status,
            document_date: document.document_date,
            created_at: to_iso(document.created_at),
        }
    }
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = documents)]
struct DocumentChangeset<'a> {
    document_name: Option<&'a str>,
    sender_name: Option<&'a str>,
    receiver_name: Option<&'a str>,
    notes: Option<Option<&'a str>>,
    action: Option<Option<&'a str>>,
    status: Option<&'a str>,
    document_date: Option<Option<NaiveDate>>,
}

pub async fn list_documents(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<DocumentResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<Document> = documents::table
        .order(documents::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(DocumentResponse::from).collect()))
}

pub async fn list_document_types() -> Json<Vec<&'static str>> {
    Json(registry::DOCUMENT_TYPES.to_vec())
}

pub async fn list_statuses() -> Json<Vec<&'static str>> {
    Json(registry::STATUSES.to_vec())
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DocumentResponse>> {
    let mut conn = state.db()?;

    let document: Option<Document> = documents::table
        .find(id.as_str())
        .first(&mut conn)
        .optional()?;

    match document {
        Some(document) => Ok(Json(document.into())),
        None => Err(AppError::not_found()),
    }
}

pub async fn create_document(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateDocumentRequest>,
) -> AppResult<(StatusCode, Json<CreateDocumentResponse>)> {
    let document_type = payload.document_type.trim().to_string();
    let document_name = payload.document_name.trim().to_string();
    let sender_name = payload.sender_name.trim().to_string();
    let receiver_name = payload.receiver_name.trim().to_string();

    if document_name.is_empty() || sender_name.is_empty() || receiver_name.is_empty() {
        return Err(AppError::bad_request(
            "document_name, sender_name and receiver_name are required",
        ));
    }
    if !registry::is_known_type(&document_type) {
        return Err(AppError::bad_request(format!(
            "invalid document type: {document_type}"
        )));
    }

    let status = match payload.status.as_deref().map(str::trim) {
        None | Some("") => registry::DEFAULT_STATUS.to_string(),
        Some(candidate) => {
            if !registry::is_known_status(candidate) {
                return Err(AppError::bad_request(format!("invalid status: {candidate}")));
            }
            candidate.to_string()
        }
    };

    let document_date = match payload.document_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_document_date(raw).map_err(AppError::bad_request)?),
    };

    let mut conn = state.db()?;

    // Counter bump and row insert commit together; an id collision can only
    // come from rows predating the counter table, so it is retried a few times.
    let mut attempt = 0;
    let document_id = loop {
        let result = conn.transaction::<String, ReferenceError, _>(|conn| {
            let id = registry::reserve_reference(conn, &document_type)?;
            let new_document = NewDocument {
                id: id.clone(),
                document_type: document_type.clone(),
                document_name: document_name.clone(),
                sender_name: sender_name.clone(),
                receiver_name: receiver_name.clone(),
                notes: payload.notes.clone(),
                action: payload.action.clone(),
                status: status.clone(),
                document_date,
            };

            diesel::insert_into(documents::table)
                .values(&new_document)
                .execute(conn)?;

            Ok(id)
        });

        match result {
            Ok(id) => break id,
            Err(ReferenceError::Database(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _,
            ))) if attempt + 1 < MAX_RESERVE_ATTEMPTS => {
                attempt += 1;
                warn!(document_type = %document_type, attempt, "reference number collision, retrying");
                sleep(RESERVE_RETRY_DELAY * attempt).await;
            }
            Err(err) => return Err(err.into()),
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateDocumentResponse {
            message: "Document created successfully".to_string(),
            document_id,
        }),
    ))
}

pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<Json<Value>> {
    let document_name = required_text(&body, "document_name")?;
    let sender_name = required_text(&body, "sender_name")?;
    let receiver_name = required_text(&body, "receiver_name")?;
    let notes = nullable_text(&body, "notes")?;
    let action = nullable_text(&body, "action")?;

    let status = match classify_nullable(body.get("status")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => None,
        NullableValue::Null => return Err(AppError::bad_request("status cannot be null")),
        NullableValue::String(value) => {
            let trimmed = value.trim();
            if !registry::is_known_status(trimmed) {
                return Err(AppError::bad_request(format!("invalid status: {trimmed}")));
            }
            Some(trimmed.to_string())
        }
    };

    let document_date =
        match classify_nullable(body.get("document_date")).map_err(AppError::bad_request)? {
            NullableValue::Omitted => None,
            NullableValue::Null => Some(None),
            NullableValue::String(value) => Some(Some(
                parse_document_date(value.trim()).map_err(AppError::bad_request)?,
            )),
        };

    if document_name.is_none()
        && sender_name.is_none()
        && receiver_name.is_none()
        && notes.is_none()
        && action.is_none()
        && status.is_none()
        && document_date.is_none()
    {
        return Err(AppError::bad_request("no fields to update"));
    }

    let changeset = DocumentChangeset {
        document_name: document_name.as_deref(),
        sender_name: sender_name.as_deref(),
        receiver_name: receiver_name.as_deref(),
        notes: notes.as_ref().map(|opt| opt.as_deref()),
        action: action.as_ref().map(|opt| opt.as_deref()),
        status: status.as_deref(),
        document_date,
    };

    let mut conn = state.db()?;
    let updated = diesel::update(documents::table.find(id.as_str()))
        .set(&changeset)
        .execute(&mut conn)?;

    if updated == 0 {
        return Err(AppError::not_found());
    }

    Ok(Json(json!({ "message": "Document updated successfully" })))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db()?;

    let deleted = diesel::delete(documents::table.find(id.as_str())).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }

    Ok(Json(json!({ "message": "Document deleted successfully" })))
}

fn required_text(body: &Value, field: &'static str) -> Result<Option<String>, AppError> {
    match classify_nullable(body.get(field)).map_err(AppError::bad_request)? {
        NullableValue::Omitted => Ok(None),
        NullableValue::Null => Err(AppError::bad_request(format!("{field} cannot be null"))),
        NullableValue::String(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(AppError::bad_request(format!("{field} must not be empty")));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

fn nullable_text(body: &Value, field: &'static str) -> Result<Option<Option<String>>, AppError> {
    match classify_nullable(body.get(field)).map_err(AppError::bad_request)? {
        NullableValue::Omitted => Ok(None),
        NullableValue::Null => Ok(Some(None)),
        NullableValue::String(value) => Ok(Some(Some(value))),
    }
}

/// Accepts a bare date, an RFC 3339 timestamp, or `Y-m-d H:M:S`; the time
/// part is dropped.
fn parse_document_date(raw: &str) -> Result<NaiveDate, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.date_naive());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(timestamp.date());
    }
    Err(format!("invalid document_date: {raw}"))
}

pub(crate) fn to_iso(dt: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).to_rfc3339()
}
