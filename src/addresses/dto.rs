use serde::Deserialize;

use super::repo_types::AddressChanges;
use crate::{common::required, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub phone: String,
}

/// Trimmed and checked copy of [`CreateAddressRequest`].
#[derive(Debug, PartialEq)]
pub struct AddressFields {
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub phone: String,
}

impl CreateAddressRequest {
    pub fn validate(&self) -> Result<AddressFields, ApiError> {
        Ok(AddressFields {
            address: required("address", &self.address)?,
            city: required("city", &self.city)?,
            province: required("province", &self.province)?,
            postal_code: required("postal_code", &self.postal_code)?,
            phone: required("phone", &self.phone)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAddressRequest {
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
}

impl UpdateAddressRequest {
    /// Present fields must not be blank.
    pub fn validate(self) -> Result<AddressChanges, ApiError> {
        let check = |field: &str, value: Option<String>| -> Result<Option<String>, ApiError> {
            value.map(|v| required(field, &v)).transpose()
        };
        Ok(AddressChanges {
            address: check("address", self.address)?,
            city: check("city", self.city)?,
            province: check("province", self.province)?,
            postal_code: check("postal_code", self.postal_code)?,
            phone: check("phone", self.phone)?,
        })
    }
}
