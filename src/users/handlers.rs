use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{dto::UpdateUserRequest, repo::UserStats};
use crate::{
    auth::{claims::Principal, repo_types::User, PublicUser},
    common::{Message, Pagination},
    db::is_unique_violation,
    error::{internal, ApiError, ApiResult, AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/users/:id/stats", get(get_user_stats))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let (limit, offset) = page.bounds();
    let users = User::list(&state.db, limit, offset)
        .await
        .map_err(internal("Failed to fetch users"))?;
    Ok(Json(
        users
            .into_iter()
            .map(|u| PublicUser::new(u, &state.roles))
            .collect(),
    ))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, id)
        .await
        .map_err(internal("Failed to fetch user"))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(PublicUser::new(user, &state.roles)))
}

/// Role and status changes reach the user's next token, not the current one.
#[instrument(skip(state, payload), fields(admin_id = %principal.user_id))]
pub async fn update_user(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> ApiResult<Json<PublicUser>> {
    let changes = payload.validate(&state.roles)?;

    let user = match User::update(&state.db, id, &changes).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(ApiError::not_found("User not found")),
        Err(e) if is_unique_violation(&e) => {
            warn!(user_id = %id, "email already registered");
            return Err(ApiError::conflict("Email already registered"));
        }
        Err(e) => return Err(ApiError::internal("Failed to update user", e)),
    };

    info!(user_id = %id, role_id = user.role_id, is_active = user.is_active, "user updated");
    Ok(Json(PublicUser::new(user, &state.roles)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Message>> {
    if id == principal.user_id {
        return Err(ApiError::validation("Cannot delete your own account"));
    }
    let deleted = User::delete(&state.db, id)
        .await
        .map_err(internal("Failed to delete user"))?;
    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }
    info!(user_id = %id, "user deleted");
    Ok(Json(Message::new("User deleted")))
}

#[instrument(skip(state))]
pub async fn get_user_stats(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<UserStats>> {
    UserStats::for_user(&state.db, id)
        .await
        .map_err(internal("Failed to fetch user stats"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}
