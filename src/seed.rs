//! Sample data for local development: `storefront --seed`.
//!
//! Every insert is idempotent, so the command can be re-run against a
//! populated database.

use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::password::hash_password,
    catalog::repo::{insert_image_tx, insert_variant_tx},
};

struct SeedUser {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    role_id: i32,
    password: &'static str,
}

const USERS: &[SeedUser] = &[
    SeedUser { name: "Admin User", email: "admin@emyu.com", phone: "08111111111", role_id: 1, password: "admin123" },
    SeedUser { name: "John Doe", email: "john@example.com", phone: "08123456789", role_id: 2, password: "password123" },
    SeedUser { name: "Jane Smith", email: "jane@example.com", phone: "08987654321", role_id: 2, password: "password123" },
    SeedUser { name: "Budi Santoso", email: "budi@example.com", phone: "08555666777", role_id: 2, password: "password123" },
    SeedUser { name: "Siti Nur Azizah", email: "siti@example.com", phone: "08444555666", role_id: 2, password: "password123" },
];

const CATEGORIES: &[(&str, &str)] = &[
    ("Sports Jersey", "Custom sports jerseys for teams and athletes"),
    ("Casual Wear", "Comfortable casual clothing with custom options"),
    ("Uniforms", "Professional uniforms for organizations"),
    ("Merchandise", "Custom branded merchandise and accessories"),
];

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: i64,
    category: &'static str,
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Premium Sports Jersey",
        description: "High-quality polyester jersey with custom name and number printing",
        price: 299_000,
        category: "Sports Jersey",
    },
    SeedProduct {
        name: "Classic Cotton T-Shirt",
        description: "100% cotton t-shirt perfect for casual wear and custom printing",
        price: 149_000,
        category: "Casual Wear",
    },
    SeedProduct {
        name: "Team Uniform Polo",
        description: "Professional polo shirt for team uniforms",
        price: 249_000,
        category: "Uniforms",
    },
    SeedProduct {
        name: "Basic White T-Shirt",
        description: "Simple white t-shirt, great for custom designs",
        price: 99_000,
        category: "Casual Wear",
    },
    SeedProduct {
        name: "Hoodie Sweater",
        description: "Comfortable hoodie with custom logo option",
        price: 349_000,
        category: "Merchandise",
    },
];

/// Size name and surcharge.
const VARIANTS: &[(&str, i64)] = &[
    ("XS", 0),
    ("S", 0),
    ("M", 0),
    ("L", 0),
    ("XL", 25_000),
    ("XXL", 50_000),
];

#[derive(Debug, Default)]
pub struct SeedReport {
    pub users_created: usize,
    pub categories: usize,
    pub products: usize,
}

pub async fn run(db: &PgPool) -> anyhow::Result<SeedReport> {
    let mut tx = db.begin().await.context("begin seed transaction")?;
    let mut report = SeedReport::default();

    for user in USERS {
        if seed_user(&mut tx, user).await? {
            info!(email = user.email, "seeded user");
            report.users_created += 1;
        }
    }

    for (name, description) in CATEGORIES {
        upsert_category(&mut tx, name, description).await?;
        report.categories += 1;
    }

    for product in PRODUCTS {
        let category_id = upsert_category(&mut tx, product.category, "").await?;
        let product_id = upsert_product(&mut tx, product, category_id).await?;
        for (size, surcharge) in VARIANTS {
            insert_variant_tx(&mut tx, product_id, size, Decimal::from(*surcharge)).await?;
        }
        let image = format!(
            "https://via.placeholder.com/400x400?text={}",
            product.name.replace(' ', "+")
        );
        insert_image_tx(&mut tx, product_id, &image).await?;
        report.products += 1;
    }

    tx.commit().await.context("commit seed transaction")?;
    info!(?report, "seed complete");
    Ok(report)
}

/// Returns false when the email is already taken.
async fn seed_user(tx: &mut Transaction<'_, Postgres>, user: &SeedUser) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(user.email)
        .fetch_one(&mut **tx)
        .await
        .context("check seed user")?;
    if exists {
        return Ok(false);
    }

    let hash = hash_password(user.password)?;
    sqlx::query(
        r#"
        INSERT INTO users (name, email, phone, role_id, password_hash, is_active)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        "#,
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.phone)
    .bind(user.role_id)
    .bind(&hash)
    .execute(&mut **tx)
    .await
    .with_context(|| format!("seed user {}", user.email))?;
    Ok(true)
}

/// Existing descriptions are left alone.
async fn upsert_category(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    description: &str,
) -> anyhow::Result<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO categories (name, description)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(description)
    .fetch_one(&mut **tx)
    .await
    .with_context(|| format!("seed category {name}"))
}

async fn upsert_product(
    tx: &mut Transaction<'_, Postgres>,
    product: &SeedProduct,
    category_id: Uuid,
) -> anyhow::Result<Uuid> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO products (name, description, price, category_id, is_customizable)
        VALUES ($1, $2, $3, $4, TRUE)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(product.name)
    .bind(product.description)
    .bind(Decimal::from(product.price))
    .bind(category_id)
    .fetch_one(&mut **tx)
    .await
    .with_context(|| format!("seed product {}", product.name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::auth::{
        roles::RoleRegistry,
        services::{is_valid_email, MIN_PASSWORD_LEN},
    };

    #[test]
    fn seed_users_are_valid_accounts() {
        let roles = RoleRegistry::fixture();
        let emails: HashSet<_> = USERS.iter().map(|u| u.email).collect();
        assert_eq!(emails.len(), USERS.len());
        for user in USERS {
            assert!(is_valid_email(user.email), "{}", user.email);
            assert!(user.password.len() >= MIN_PASSWORD_LEN, "{}", user.email);
            assert!(roles.get(user.role_id).is_some());
        }
        assert!(USERS.iter().any(|u| u.role_id == 1));
    }

    #[test]
    fn every_product_has_a_seeded_category() {
        let names: HashSet<_> = CATEGORIES.iter().map(|(n, _)| *n).collect();
        for product in PRODUCTS {
            assert!(names.contains(product.category), "{}", product.name);
            assert!(product.price > 0);
        }
    }

    #[test]
    fn sizes_run_xs_to_xxl() {
        let sizes: Vec<_> = VARIANTS.iter().map(|(s, _)| *s).collect();
        assert_eq!(sizes, ["XS", "S", "M", "L", "XL", "XXL"]);
        assert!(VARIANTS.iter().all(|(_, surcharge)| *surcharge >= 0));
    }
}
