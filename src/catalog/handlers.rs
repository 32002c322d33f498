use axum::{
    extract::State,
    http::{header::LOCATION, HeaderName, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        CreateCategoryRequest, CreateProductRequest, ProductFilter, UpdateCategoryRequest,
        UpdateProductRequest,
    },
    repo::{find_detail, insert_image_tx, insert_product_tx, insert_variant_tx},
    repo_types::{Category, NewProduct, Product, ProductDetail},
};
use crate::{
    common::{required, Created, Message, Pagination},
    db::{is_foreign_key_violation, is_unique_violation},
    error::{internal, ApiError, ApiResult, AppJson, AppPath, AppQuery},
    state::AppState,
};

// --- routers ---

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/categories", get(list_categories))
        .route("/categories/:id", get(get_category))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
        .route("/categories", post(create_category))
        .route("/categories/:id", put(update_category).delete(delete_category))
}

fn write_error(e: anyhow::Error, conflict: &'static str, message: &'static str) -> ApiError {
    if is_unique_violation(&e) {
        ApiError::conflict(conflict)
    } else if is_foreign_key_violation(&e) {
        ApiError::validation("Unknown category")
    } else {
        ApiError::internal(message, e)
    }
}

// --- products ---

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<Pagination>,
    AppQuery(filter): AppQuery<ProductFilter>,
) -> ApiResult<Json<Vec<Product>>> {
    let (limit, offset) = page.bounds();
    let products = Product::list(&state.db, filter.category_id, limit, offset)
        .await
        .map_err(internal("Failed to fetch products"))?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ProductDetail>> {
    find_detail(&state.db, id)
        .await
        .map_err(internal("Failed to fetch product"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

/// Product, images and variants are written in one transaction.
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProductRequest>,
) -> ApiResult<(StatusCode, [(HeaderName, String); 1], Json<Created>)> {
    let draft = payload.validate()?;

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(internal("Failed to create product"))?;

    let new = NewProduct {
        name: &draft.name,
        description: &draft.description,
        price: draft.price,
        category_id: draft.category_id,
        is_customizable: draft.is_customizable,
    };
    let id = insert_product_tx(&mut tx, &new)
        .await
        .map_err(|e| write_error(e, "Product name already exists", "Failed to create product"))?;

    for url in &draft.images {
        insert_image_tx(&mut tx, id, url)
            .await
            .map_err(internal("Failed to create product"))?;
    }
    for variant in &draft.variants {
        insert_variant_tx(&mut tx, id, &variant.name, variant.price_adjustment)
            .await
            .map_err(internal("Failed to create product"))?;
    }

    tx.commit()
        .await
        .map_err(internal("Failed to create product"))?;

    info!(product_id = %id, name = %draft.name, variants = draft.variants.len(), "product created");
    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/api/products/{id}"))],
        Json(Created {
            id,
            message: "Product created",
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    let changes = payload.validate()?;
    let product = Product::update(&state.db, id, &changes)
        .await
        .map_err(|e| write_error(e, "Product name already exists", "Failed to update product"))?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    info!(product_id = %id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Message>> {
    match Product::delete(&state.db, id).await {
        Ok(true) => {
            info!(product_id = %id, "product deleted");
            Ok(Json(Message::new("Product deleted")))
        }
        Ok(false) => Err(ApiError::not_found("Product not found")),
        Err(e) if is_foreign_key_violation(&e) => {
            warn!(product_id = %id, "product is referenced by orders");
            Err(ApiError::conflict("Product has been ordered and cannot be deleted"))
        }
        Err(e) => Err(ApiError::internal("Failed to delete product", e)),
    }
}

// --- categories ---

#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = Category::list(&state.db)
        .await
        .map_err(internal("Failed to fetch categories"))?;
    Ok(Json(categories))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Category>> {
    Category::find(&state.db, id)
        .await
        .map_err(internal("Failed to fetch category"))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category not found"))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, [(HeaderName, String); 1], Json<Category>)> {
    let name = required("name", &payload.name)?;
    let category = Category::create(&state.db, &name, payload.description.trim())
        .await
        .map_err(|e| write_error(e, "Category name already exists", "Failed to create category"))?;

    info!(category_id = %category.id, %name, "category created");
    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/api/categories/{}", category.id))],
        Json(category),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    let name = payload.name.map(|n| required("name", &n)).transpose()?;
    let description = payload.description.map(|d| d.trim().to_string());

    let category = Category::update(&state.db, id, name.as_deref(), description.as_deref())
        .await
        .map_err(|e| write_error(e, "Category name already exists", "Failed to update category"))?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(Json(category))
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Message>> {
    let deleted = Category::delete(&state.db, id)
        .await
        .map_err(internal("Failed to delete category"))?;
    if !deleted {
        return Err(ApiError::not_found("Category not found"));
    }
    info!(category_id = %id, "category deleted");
    Ok(Json(Message::new("Category deleted")))
}
