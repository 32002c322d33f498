use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{check_rating, CreateReviewRequest, UpdateReviewRequest},
    repo_types::Review,
};
use crate::{
    auth::claims::Principal,
    catalog::repo_types::Product,
    common::{check_owner, Created, Message},
    error::{internal, ApiError, ApiResult, AppJson, AppPath},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/reviews/user", get(list_user_reviews))
        .route("/reviews/products/:product_id", get(list_product_reviews))
        .route("/reviews/:id", put(update_review).delete(delete_review))
}

#[instrument(skip(state))]
pub async fn list_product_reviews(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<Uuid>,
) -> ApiResult<Json<Vec<Review>>> {
    let reviews = Review::list_by_product(&state.db, product_id)
        .await
        .map_err(internal("Failed to fetch reviews"))?;
    Ok(Json(reviews))
}

#[instrument(skip(state))]
pub async fn list_user_reviews(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<Vec<Review>>> {
    let reviews = Review::list_by_user(&state.db, principal.user_id)
        .await
        .map_err(internal("Failed to fetch reviews"))?;
    Ok(Json(reviews))
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    principal: Principal,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    check_rating(payload.rating)?;

    let exists = Product::exists(&state.db, payload.product_id)
        .await
        .map_err(internal("Failed to create review"))?;
    if !exists {
        return Err(ApiError::not_found("Product not found"));
    }

    let id = Review::create(
        &state.db,
        principal.user_id,
        payload.product_id,
        payload.rating,
        payload.comment.trim(),
    )
    .await
    .map_err(internal("Failed to create review"))?;

    info!(review_id = %id, product_id = %payload.product_id, rating = payload.rating, "review created");
    Ok((
        StatusCode::CREATED,
        Json(Created {
            id,
            message: "Review created",
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> ApiResult<Json<Review>> {
    if let Some(rating) = payload.rating {
        check_rating(rating)?;
    }

    let owner = Review::owner_of(&state.db, id)
        .await
        .map_err(internal("Failed to update review"))?;
    check_owner(owner, principal.user_id, "Review")?;

    let comment = payload.comment.as_deref().map(str::trim);
    Review::update(&state.db, id, payload.rating, comment)
        .await
        .map_err(internal("Failed to update review"))?;

    let review = Review::find(&state.db, id)
        .await
        .map_err(internal("Failed to update review"))?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;
    Ok(Json(review))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    principal: Principal,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Message>> {
    let owner = Review::owner_of(&state.db, id)
        .await
        .map_err(internal("Failed to delete review"))?;
    check_owner(owner, principal.user_id, "Review")?;

    Review::delete(&state.db, id)
        .await
        .map_err(internal("Failed to delete review"))?;

    info!(review_id = %id, "review deleted");
    Ok(Json(Message::new("Review deleted")))
}
