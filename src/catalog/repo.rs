use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{
    Category, NewProduct, Product, ProductChanges, ProductDetail, ProductImage, ProductVariant,
};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category_id, is_customizable, created_at, updated_at";

// ---- categories ----

impl Category {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at, updated_at FROM categories ORDER BY name",
        )
        .fetch_all(db)
        .await
        .context("list categories")
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Category>> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find category")
    }

    pub async fn create(db: &PgPool, name: &str, description: &str) -> anyhow::Result<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(db)
        .await
        .context("insert category")
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> anyhow::Result<Option<Category>> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
               SET name        = COALESCE($2, name),
                   description = COALESCE($3, description),
                   updated_at  = now()
             WHERE id = $1
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(db)
        .await
        .context("update category")
    }

    /// Products in the category keep existing with no category.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete category")?;
        Ok(res.rows_affected() > 0)
    }
}

// ---- products ----

impl Product {
    pub async fn list(
        db: &PgPool,
        category_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
              FROM products
             WHERE ($1::uuid IS NULL OR category_id = $1)
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(category_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list products")
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find product")
    }

    pub async fn exists(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(db)
            .await
            .context("check product exists")
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        changes: &ProductChanges,
    ) -> anyhow::Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
               SET name            = COALESCE($2, name),
                   description     = COALESCE($3, description),
                   price           = COALESCE($4, price),
                   category_id     = CASE WHEN $5::boolean THEN $6::uuid ELSE category_id END,
                   is_customizable = COALESCE($7, is_customizable),
                   updated_at      = now()
             WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.price)
        .bind(changes.category_id.is_some())
        .bind(changes.category_id.flatten())
        .bind(changes.is_customizable)
        .fetch_optional(db)
        .await
        .context("update product")
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete product")?;
        Ok(res.rows_affected() > 0)
    }
}

pub async fn find_detail(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ProductDetail>> {
    let Some(product) = Product::find(db, id).await? else {
        return Ok(None);
    };

    let category = match product.category_id {
        Some(category_id) => Category::find(db, category_id).await?,
        None => None,
    };

    let images = sqlx::query_as::<_, ProductImage>(
        r#"
        SELECT id, product_id, image_url, created_at
          FROM product_images
         WHERE product_id = $1
         ORDER BY created_at ASC
        "#,
    )
    .bind(id)
    .fetch_all(db)
    .await
    .context("list product images")?;

    let variants = sqlx::query_as::<_, ProductVariant>(
        r#"
        SELECT id, product_id, name, price_adjustment, created_at
          FROM product_variants
         WHERE product_id = $1
         ORDER BY created_at ASC, name ASC
        "#,
    )
    .bind(id)
    .fetch_all(db)
    .await
    .context("list product variants")?;

    Ok(Some(ProductDetail {
        product,
        category,
        images,
        variants,
    }))
}

// ---- transactional inserts ----

pub async fn insert_product_tx(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewProduct<'_>,
) -> anyhow::Result<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO products (name, description, price, category_id, is_customizable)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(new.name)
    .bind(new.description)
    .bind(new.price)
    .bind(new.category_id)
    .bind(new.is_customizable)
    .fetch_one(&mut **tx)
    .await
    .context("insert product")
}

pub async fn insert_image_tx(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    image_url: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO product_images (product_id, image_url)
        VALUES ($1, $2)
        ON CONFLICT (product_id, image_url) DO NOTHING
        "#,
    )
    .bind(product_id)
    .bind(image_url)
    .execute(&mut **tx)
    .await
    .context("insert product image")?;
    Ok(())
}

pub async fn insert_variant_tx(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    name: &str,
    price_adjustment: Decimal,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO product_variants (product_id, name, price_adjustment)
        VALUES ($1, $2, $3)
        ON CONFLICT (product_id, name) DO NOTHING
        "#,
    )
    .bind(product_id)
    .bind(name)
    .bind(price_adjustment)
    .execute(&mut **tx)
    .await
    .context("insert product variant")?;
    Ok(())
}
