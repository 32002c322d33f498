use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::repo_types::{NewVariant, ProductChanges};
use crate::{
    common::{double_option, required},
    error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_customizable: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<VariantRequest>,
}

#[derive(Debug, Deserialize)]
pub struct VariantRequest {
    pub name: String,
    #[serde(default)]
    pub price_adjustment: Decimal,
}

/// Validated product, ready to insert.
#[derive(Debug, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub is_customizable: bool,
    pub images: Vec<String>,
    pub variants: Vec<NewVariant>,
}

fn check_price(price: Decimal) -> Result<(), ApiError> {
    if price <= Decimal::ZERO {
        return Err(ApiError::validation("price must be greater than 0"));
    }
    Ok(())
}

impl CreateProductRequest {
    pub fn validate(self) -> Result<ProductDraft, ApiError> {
        let name = required("name", &self.name)?;
        check_price(self.price)?;

        let images = self
            .images
            .iter()
            .map(|url| required("image_url", url))
            .collect::<Result<Vec<_>, _>>()?;
        let variants = self
            .variants
            .into_iter()
            .map(|v| {
                Ok(NewVariant {
                    name: required("variant name", &v.name)?,
                    price_adjustment: v.price_adjustment,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(ProductDraft {
            name,
            description: self.description.trim().to_string(),
            price: self.price,
            category_id: self.category_id,
            is_customizable: self.is_customizable,
            images,
            variants,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    pub is_customizable: Option<bool>,
}

impl UpdateProductRequest {
    pub fn validate(self) -> Result<ProductChanges, ApiError> {
        let name = self.name.map(|n| required("name", &n)).transpose()?;
        if let Some(price) = self.price {
            check_price(price)?;
        }
        Ok(ProductChanges {
            name,
            description: self.description.map(|d| d.trim().to_string()),
            price: self.price,
            category_id: self.category_id,
            is_customizable: self.is_customizable,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}
