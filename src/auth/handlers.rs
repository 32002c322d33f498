use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::Principal,
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        password::{hash_password, verify_password},
        repo_types::{NewUser, User},
        services::{
            is_valid_email, issue_token, normalize_email, DEFAULT_ROLE, MIN_PASSWORD_LEN,
        },
    },
    common::{required, Message},
    db::is_unique_violation,
    error::{internal, ApiError, ApiResult, AppJson},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let name = required("name", &payload.name)?;
    let email = normalize_email(&payload.email);
    let phone = payload.phone.trim();

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // Checked, not transactional: two concurrent registrations can both pass
    // here and the unique index decides.
    let existing = User::find_by_email(&state.db, &email)
        .await
        .map_err(internal("Failed to create user"))?;
    if existing.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::conflict("Email already registered"));
    }

    let role = state.roles.by_name(DEFAULT_ROLE).ok_or_else(|| {
        ApiError::internal(
            "Failed to fetch user role",
            anyhow::anyhow!("default role `{DEFAULT_ROLE}` is not registered"),
        )
    })?;

    let hash = hash_password(&payload.password).map_err(internal("Failed to hash password"))?;

    let new_user = NewUser {
        name: &name,
        email: &email,
        phone,
        role_id: role.id,
        password_hash: &hash,
    };
    let user = match User::create(&state.db, &new_user).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(%email, "email registered concurrently");
            return Err(ApiError::conflict("Email already registered"));
        }
        Err(e) => return Err(ApiError::internal("Failed to create user", e)),
    };

    let token = issue_token(&state, &user)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: PublicUser::new(user, &state.roles),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }

    let user = match User::find_by_email(&state.db, &email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%email, "login unknown email");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
        Err(e) => return Err(ApiError::internal("Failed to log in", e)),
    };

    let ok = verify_password(&user.password_hash, &payload.password)
        .map_err(internal("Failed to log in"))?;
    if !ok {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }
    if !user.is_active {
        warn!(user_id = %user.id, "login on inactive account");
        return Err(ApiError::forbidden("Account is inactive"));
    }

    let token = issue_token(&state, &user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        user: PublicUser::new(user, &state.roles),
        token,
    }))
}

/// Tokens are stateless; the client discards its copy.
#[instrument(skip_all, fields(user_id = %principal.user_id))]
pub async fn logout(principal: Principal) -> Json<Message> {
    info!("user logged out");
    Json(Message::new("Logged out successfully"))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, principal.user_id)
        .await
        .map_err(internal("Failed to fetch profile"))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(PublicUser::new(user, &state.roles)))
}

#[cfg(test)]
mod me_tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn public_user_hides_password_hash() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            name: "Jane".into(),
            email: "test@example.com".to_string(),
            phone: String::new(),
            role_id: 2,
            password_hash: "$argon2id$secret".into(),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let response = PublicUser::new(user, &crate::auth::roles::RoleRegistry::fixture());

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"role\":\"user\""));
        assert!(!json.contains("argon2"));
    }
}
