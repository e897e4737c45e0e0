use pushkind_common::repository::errors::RepositoryError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::price::{lower_bound_cents, upper_bound_cents};
use crate::domain::product::{Product, ProductListQuery, ProductSort, ProductSortField};
use crate::forms::products::{CreateProductPayload, ProductFormError, UpdateProductPayload};
use crate::logging::InventoryLogger;
use crate::repository::{ProductReader, ProductWriter};
use crate::services::ServiceError;

/// Fixed page size of the public product listing.
pub const PRODUCTS_PER_PAGE: usize = 2;

/// Errors surfaced by the JSON product endpoints.
#[derive(Debug, Error)]
pub enum ProductApiError {
    #[error("Order by should be either name or price")]
    InvalidOrdering,
    #[error("page does not exist")]
    PageNotFound,
    #[error(transparent)]
    Form(#[from] ProductFormError),
    #[error("{0}")]
    Service(ServiceError),
}

impl From<ServiceError> for ProductApiError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<RepositoryError> for ProductApiError {
    fn from(value: RepositoryError) -> Self {
        Self::Service(ServiceError::from(value))
    }
}

pub type ProductApiResult<T> = Result<T, ProductApiError>;

/// Query parameters accepted by `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    /// Requested page (1-based).
    pub page: Option<i64>,
    /// Exclusive upper price bound; unbounded when absent.
    pub price_less_than: Option<Decimal>,
    /// Exclusive lower price bound; zero when absent.
    pub price_greater_than: Option<Decimal>,
    /// Either `name` or `price`.
    pub order_by: Option<String>,
}

/// Public representation of a product. Timestamps are not exposed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProductProjection {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
}

impl From<Product> for ProductProjection {
    fn from(product: Product) -> Self {
        let price = product.price();
        Self {
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            price,
            stock: product.stock,
        }
    }
}

/// Response body of `GET /products`.
#[derive(Debug, Serialize)]
pub struct ProductsPage {
    pub products: Vec<ProductProjection>,
    pub page: usize,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    #[serde(rename = "totalItems")]
    pub total_items: usize,
}

/// Lists one page of products matching the price window, optionally ordered.
pub fn list_products<R>(
    repo: &R,
    logger: &InventoryLogger,
    query: ProductsQuery,
) -> ProductApiResult<ProductsPage>
where
    R: ProductReader + ?Sized,
{
    let logger = logger.scoped("products");

    let ordering = match query.order_by.as_deref().filter(|value| !value.is_empty()) {
        Some("name") => Some(ProductSort::asc(ProductSortField::Name)),
        Some("price") => Some(ProductSort::asc(ProductSortField::Price)),
        Some(other) => {
            logger.error(format_args!("Unknown order by query param `{other}` was given"));
            return Err(ProductApiError::InvalidOrdering);
        }
        None => None,
    };

    let page = match query.page.unwrap_or(1) {
        page if page >= 1 => page as usize,
        _ => return Err(ProductApiError::PageNotFound),
    };

    let lower = query.price_greater_than.unwrap_or(Decimal::ZERO);
    let mut list_query = ProductListQuery::new()
        .price_above(lower_bound_cents(lower))
        .paginate(page, PRODUCTS_PER_PAGE);

    if let Some(upper) = query.price_less_than {
        list_query = list_query.price_below(upper_bound_cents(upper));
    }

    if let Some(sort) = ordering {
        list_query = list_query.order_by(sort);
    }

    logger.debug(format_args!("products for the given query params {list_query:?}"));

    let (total, items) = repo.list_products(list_query)?;

    // An empty listing still has a first page.
    let total_pages = total.div_ceil(PRODUCTS_PER_PAGE).max(1);
    if page > total_pages {
        return Err(ProductApiError::PageNotFound);
    }

    Ok(ProductsPage {
        products: items.into_iter().map(ProductProjection::from).collect(),
        page,
        has_next: page < total_pages,
        total_items: total,
    })
}

/// Creates a product from a JSON payload.
pub fn create_product<R>(
    repo: &R,
    logger: &InventoryLogger,
    payload: CreateProductPayload,
) -> ProductApiResult<Product>
where
    R: ProductWriter + ?Sized,
{
    let logger = logger.scoped("products");
    logger.debug(format_args!("Given request data {payload:?}"));

    let new_product = payload.into_new_product().inspect_err(|err| {
        if matches!(err, ProductFormError::MissingRequiredKeys) {
            logger.warn(format_args!("Missing some fields in the request"));
        }
    })?;

    let created = repo.create_product(&new_product)?;
    logger.debug(format_args!("product {} created successfully", created.id));

    Ok(created)
}

/// Fetches a single product projection.
pub fn get_product<R>(
    repo: &R,
    logger: &InventoryLogger,
    product_id: i32,
) -> ProductApiResult<ProductProjection>
where
    R: ProductReader + ?Sized,
{
    let logger = logger.scoped("products");
    logger.debug(format_args!("Given product_id {product_id}"));

    let product = fetch_product(repo, product_id)?;
    let projection = ProductProjection::from(product);
    logger.debug(format_args!(
        "the product for the given product id {product_id} is {projection:?}"
    ));

    Ok(projection)
}

/// Applies a partial update; only fields present in the payload change.
pub fn update_product<R>(
    repo: &R,
    logger: &InventoryLogger,
    product_id: i32,
    payload: UpdateProductPayload,
) -> ProductApiResult<ProductProjection>
where
    R: ProductReader + ProductWriter + ?Sized,
{
    let logger = logger.scoped("products");
    logger.debug(format_args!("Given product_id {product_id}"));

    fetch_product(repo, product_id)?;

    let updates = payload.into_update_product()?;
    let updated = repo.update_product(product_id, &updates)?;

    Ok(updated.into())
}

/// Removes a product.
pub fn delete_product<R>(
    repo: &R,
    logger: &InventoryLogger,
    product_id: i32,
) -> ProductApiResult<()>
where
    R: ProductWriter + ?Sized,
{
    let logger = logger.scoped("products");

    repo.delete_product(product_id)?;
    logger.debug(format_args!("Product {product_id} is deleted"));

    Ok(())
}

fn fetch_product<R>(repo: &R, product_id: i32) -> ProductApiResult<Product>
where
    R: ProductReader + ?Sized,
{
    repo.get_product_by_id(product_id)?
        .ok_or(ProductApiError::Service(ServiceError::NotFound))
}
