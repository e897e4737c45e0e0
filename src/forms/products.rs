use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::price::price_to_cents;
use crate::domain::product::{NewProduct, UpdateProduct};

/// Maximum allowed length for a product name.
const NAME_MAX_LEN: usize = 100;
const NAME_MAX_LEN_VALIDATOR: u64 = NAME_MAX_LEN as u64;

/// Result type returned by the product form helpers.
pub type ProductFormResult<T> = Result<T, ProductFormError>;

/// Errors that can occur while processing product payloads and forms.
#[derive(Debug, Error)]
pub enum ProductFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// A create payload lacked one of the mandatory keys (or carried an empty value).
    #[error("following keys needs to be present: name, description, price, stock")]
    MissingRequiredKeys,
    /// An update payload did not carry any editable field.
    #[error("Missing required fields")]
    NothingToUpdate,
    #[error("Bad request : Price can't be negative")]
    NegativePrice,
    #[error("Bad Request : Stock can't be negative")]
    NegativeStock,
    /// The provided name is empty after sanitization.
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("invalid price `{value}`")]
    InvalidPrice { value: String },
    #[error("invalid stock `{value}`")]
    InvalidStock { value: String },
    /// The price does not fit into ten digits with two decimal places.
    #[error("price is out of range")]
    PriceOutOfRange,
    #[error("stock is out of range")]
    StockOutOfRange,
}

/// JSON body accepted by `POST /products`.
///
/// Every field is optional at the parsing stage so that missing keys can be
/// reported with a single message.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateProductPayload {
    #[validate(length(max = NAME_MAX_LEN_VALIDATOR))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}

impl CreateProductPayload {
    /// Validates the payload into a domain `NewProduct`.
    pub fn into_new_product(self) -> ProductFormResult<NewProduct> {
        let name = self.name.as_deref().map(sanitize_inline_text);
        let description = self.description.as_deref().map(sanitize_multiline_text);

        let (Some(name), Some(description), Some(price), Some(stock)) =
            (name, description, self.price, self.stock)
        else {
            return Err(ProductFormError::MissingRequiredKeys);
        };

        if name.is_empty() || description.is_empty() || price.is_zero() || stock == 0 {
            return Err(ProductFormError::MissingRequiredKeys);
        }

        if price.is_sign_negative() {
            return Err(ProductFormError::NegativePrice);
        }

        if stock < 0 {
            return Err(ProductFormError::NegativeStock);
        }

        self.validate()?;

        let price_cents = price_to_cents(price).ok_or(ProductFormError::PriceOutOfRange)?;
        let stock = i32::try_from(stock).map_err(|_| ProductFormError::StockOutOfRange)?;

        Ok(NewProduct::new(name, description, price_cents, stock))
    }
}

/// JSON body accepted by `PUT /products/{id}`.
///
/// Absent and `null` fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProductPayload {
    #[validate(length(max = NAME_MAX_LEN_VALIDATOR))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}

impl UpdateProductPayload {
    /// Validates the payload into a domain `UpdateProduct`.
    pub fn into_update_product(self) -> ProductFormResult<UpdateProduct> {
        self.validate()?;

        let mut updates = UpdateProduct::new();

        if let Some(name) = self.name {
            let sanitized = sanitize_inline_text(&name);
            if sanitized.is_empty() {
                return Err(ProductFormError::EmptyName);
            }
            updates = updates.name(sanitized);
        }

        if let Some(description) = self.description {
            updates = updates.description(sanitize_multiline_text(&description));
        }

        if let Some(price) = self.price {
            if price.is_sign_negative() && !price.is_zero() {
                return Err(ProductFormError::NegativePrice);
            }
            let cents = price_to_cents(price).ok_or(ProductFormError::PriceOutOfRange)?;
            updates = updates.price_cents(cents);
        }

        if let Some(stock) = self.stock {
            if stock < 0 {
                return Err(ProductFormError::NegativeStock);
            }
            let stock = i32::try_from(stock).map_err(|_| ProductFormError::StockOutOfRange)?;
            updates = updates.stock(stock);
        }

        if updates.is_empty() {
            return Err(ProductFormError::NothingToUpdate);
        }

        Ok(updates)
    }
}

/// Form payload submitted from the admin panel when adding or editing a product.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminProductForm {
    #[validate(length(min = 1, max = NAME_MAX_LEN_VALIDATOR))]
    pub name: String,
    pub description: String,
    /// Decimal price as typed by the operator, e.g. `12.50`.
    pub price: String,
    pub stock: String,
}

/// Values parsed from an [`AdminProductForm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminProductValues {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i32,
}

impl AdminProductValues {
    pub fn into_new_product(self) -> NewProduct {
        NewProduct::new(self.name, self.description, self.price_cents, self.stock)
    }

    pub fn into_update_product(self) -> UpdateProduct {
        UpdateProduct::new()
            .name(self.name)
            .description(self.description)
            .price_cents(self.price_cents)
            .stock(self.stock)
    }
}

impl AdminProductForm {
    /// Validates and sanitizes the form. Sign checks are left to the save guard.
    pub fn parse(self) -> ProductFormResult<AdminProductValues> {
        self.validate()?;

        let name = sanitize_inline_text(&self.name);
        if name.is_empty() {
            return Err(ProductFormError::EmptyName);
        }

        let description = sanitize_multiline_text(&self.description);

        let price_raw = self.price.trim().replace(',', ".");
        let price = Decimal::from_str(&price_raw).map_err(|_| ProductFormError::InvalidPrice {
            value: self.price.trim().to_string(),
        })?;
        let price_cents = price_to_cents(price).ok_or(ProductFormError::PriceOutOfRange)?;

        let stock = self
            .stock
            .trim()
            .parse::<i32>()
            .map_err(|_| ProductFormError::InvalidStock {
                value: self.stock.trim().to_string(),
            })?;

        Ok(AdminProductValues {
            name,
            description,
            price_cents,
            stock,
        })
    }
}

fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

fn sanitize_multiline_text(input: &str) -> String {
    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            line.trim_end()
                .chars()
                .filter(|ch| !ch.is_control())
                .collect()
        })
        .collect();

    lines.join("\n").trim().to_string()
}
