use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use diesel::{prelude::*, result::DatabaseErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::password;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, User};
use crate::schema::users;
use crate::state::AppState;
use crate::utils::json::{classify_nullable, JsonBody, NullableValue};

use super::documents::to_iso;

const DEFAULT_ROLE: &str = "member";

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub branchid: Option<String>,
}

// The password hash stays out of every response shape on purpose.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub branchid: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            branchid: user.branchid,
            created_at: to_iso(user.created_at),
            updated_at: to_iso(user.updated_at),
        }
    }
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = users)]
struct UserChangeset<'a> {
    username: Option<&'a str>,
    password_hash: Option<&'a str>,
    role: Option<&'a str>,
    branchid: Option<Option<&'a str>>,
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<User> = users::table.order(users::username.asc()).load(&mut conn)?;

    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let mut conn = state.db()?;

    let user: Option<User> = users::table.find(user_id).first(&mut conn).optional()?;

    match user {
        Some(user) => Ok(Json(user.into())),
        None => Err(AppError::not_found()),
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }

    let role = match payload.role.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_ROLE.to_string(),
        Some(role) => role.to_string(),
    };
    let branchid = payload
        .branchid
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let password_hash = password::hash_password(&payload.password)?;
    let new_user = NewUser {
        id: Uuid::new_v4(),
        username,
        password_hash,
        role,
        branchid,
    };

    let mut conn = state.db()?;
    match diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(AppError::bad_request("username already exists"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user_id": new_user.id,
        })),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    JsonBody(body): JsonBody<Value>,
) -> AppResult<Json<Value>> {
    let username = match classify_nullable(body.get("username")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => None,
        NullableValue::Null => return Err(AppError::bad_request("username cannot be null")),
        NullableValue::String(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(AppError::bad_request("username must not be empty"));
            }
            Some(trimmed.to_string())
        }
    };

    let password_hash =
        match classify_nullable(body.get("password")).map_err(AppError::bad_request)? {
            NullableValue::Omitted => None,
            NullableValue::Null => return Err(AppError::bad_request("password cannot be null")),
            NullableValue::String(value) => {
                if value.is_empty() {
                    return Err(AppError::bad_request("password must not be empty"));
                }
                Some(password::hash_password(&value)?)
            }
        };

    let role = match classify_nullable(body.get("role")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => None,
        NullableValue::Null => return Err(AppError::bad_request("role cannot be null")),
        NullableValue::String(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(AppError::bad_request("role must not be empty"));
            }
            Some(trimmed.to_string())
        }
    };

    let branchid = match classify_nullable(body.get("branchid")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => None,
        NullableValue::Null => Some(None),
        NullableValue::String(value) => Some(Some(value.trim().to_string())),
    };

    if username.is_none() && password_hash.is_none() && role.is_none() && branchid.is_none() {
        return Err(AppError::bad_request("no fields to update"));
    }

    let changeset = UserChangeset {
        username: username.as_deref(),
        password_hash: password_hash.as_deref(),
        role: role.as_deref(),
        branchid: branchid.as_ref().map(|opt| opt.as_deref()),
    };

    let mut conn = state.db()?;
    let now = Utc::now().naive_utc();
    let updated = match diesel::update(users::table.find(user_id))
        .set((&changeset, users::updated_at.eq(now)))
        .execute(&mut conn)
    {
        Ok(count) => count,
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(AppError::bad_request("username already exists"));
        }
        Err(err) => return Err(AppError::from(err)),
    };

    if updated == 0 {
        return Err(AppError::not_found());
    }

    Ok(Json(json!({ "message": "User updated successfully" })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let mut conn = state.db()?;

    let deleted = diesel::delete(users::table.find(user_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }

    Ok(Json(json!({ "message": "User deleted successfully" })))
}
