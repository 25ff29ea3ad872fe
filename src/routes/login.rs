use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::password;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::schema::users;
use crate::state::AppState;
use crate::utils::json::JsonBody;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: LoginUser,
}

#[derive(Serialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub branchid: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }

    let mut conn = state.db()?;

    let user: Option<User> = users::table
        .filter(users::username.eq(payload.username.trim()))
        .first(&mut conn)
        .optional()?;

    // Unknown users and wrong passwords are indistinguishable to the caller.
    let user = match user {
        Some(user) => user,
        None => return Err(AppError::unauthorized()),
    };

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::unauthorized())?;
    if !valid {
        return Err(AppError::unauthorized());
    }

    let token = state.jwt.generate_token(&user)?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: LoginUser {
            id: user.id,
            username: user.username,
            role: user.role,
            branchid: user.branchid,
        },
    }))
}
