use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, delete, get, post, put, web};
use pushkind_common::domain::auth::AuthenticatedUser;
use serde_json::json;

use crate::forms::products::{CreateProductPayload, ProductFormError, UpdateProductPayload};
use crate::logging::InventoryLogger;
use crate::repository::{DieselRepository, ProductReader, ProductWriter};
use crate::services::ServiceError;
use crate::services::products::{self, ProductApiError, ProductsQuery};

impl ResponseError for ProductApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProductApiError::InvalidOrdering | ProductApiError::PageNotFound => {
                StatusCode::NOT_FOUND
            }
            ProductApiError::Form(_) => StatusCode::BAD_REQUEST,
            ProductApiError::Service(ServiceError::NotFound) => StatusCode::NOT_FOUND,
            ProductApiError::Service(ServiceError::Unauthorized) => StatusCode::FORBIDDEN,
            ProductApiError::Service(ServiceError::Form(_)) => StatusCode::BAD_REQUEST,
            ProductApiError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            ProductApiError::PageNotFound => response.json(json!({ "error": self.to_string() })),
            ProductApiError::Form(ProductFormError::NothingToUpdate) => {
                response.json(json!({ "detail": self.to_string() }))
            }
            ProductApiError::InvalidOrdering | ProductApiError::Form(_) => {
                response.json(self.to_string())
            }
            ProductApiError::Service(ServiceError::NotFound) => {
                response.json(json!({ "detail": "Not found." }))
            }
            ProductApiError::Service(ServiceError::Unauthorized) => response.json(
                json!({ "detail": "You do not have permission to perform this action." }),
            ),
            ProductApiError::Service(ServiceError::Form(message)) => response.json(message),
            ProductApiError::Service(_) => response.finish(),
        }
    }
}

fn log_failure(logger: &InventoryLogger, action: &str, err: &ProductApiError) {
    if err.status_code().is_server_error() {
        logger.error(format_args!("Failed to {action}: {err}"));
    } else {
        logger.debug(format_args!("Rejected request to {action}: {err}"));
    }
}

#[get("/products")]
/// Return one page of products filtered by price and optionally ordered.
pub async fn api_list_products(
    params: web::Query<ProductsQuery>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    logger: web::Data<InventoryLogger>,
) -> Result<HttpResponse, ProductApiError> {
    list_products_response(repo.get_ref(), &logger, params.into_inner())
}

#[post("/products")]
/// Create a product from a JSON body carrying name, description, price and stock.
pub async fn api_create_product(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    logger: web::Data<InventoryLogger>,
    web::Json(payload): web::Json<CreateProductPayload>,
) -> Result<HttpResponse, ProductApiError> {
    create_product_response(repo.get_ref(), &logger, payload)
}

#[get("/products/{product_id}")]
pub async fn api_get_product(
    path: web::Path<i32>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    logger: web::Data<InventoryLogger>,
) -> Result<HttpResponse, ProductApiError> {
    get_product_response(repo.get_ref(), &logger, path.into_inner())
}

#[put("/products/{product_id}")]
/// Apply a partial update; only the supplied fields change.
pub async fn api_update_product(
    path: web::Path<i32>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    logger: web::Data<InventoryLogger>,
    web::Json(payload): web::Json<UpdateProductPayload>,
) -> Result<HttpResponse, ProductApiError> {
    update_product_response(repo.get_ref(), &logger, path.into_inner(), payload)
}

#[delete("/products/{product_id}")]
pub async fn api_delete_product(
    path: web::Path<i32>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    logger: web::Data<InventoryLogger>,
) -> Result<HttpResponse, ProductApiError> {
    delete_product_response(repo.get_ref(), &logger, path.into_inner())
}

fn list_products_response<R>(
    repo: &R,
    logger: &InventoryLogger,
    query: ProductsQuery,
) -> Result<HttpResponse, ProductApiError>
where
    R: ProductReader + ?Sized,
{
    let page = products::list_products(repo, logger, query)
        .inspect_err(|err| log_failure(logger, "list products", err))?;

    Ok(HttpResponse::Ok().json(page))
}

fn create_product_response<R>(
    repo: &R,
    logger: &InventoryLogger,
    payload: CreateProductPayload,
) -> Result<HttpResponse, ProductApiError>
where
    R: ProductWriter + ?Sized,
{
    products::create_product(repo, logger, payload)
        .inspect_err(|err| log_failure(logger, "create product", err))?;

    Ok(HttpResponse::Created().json("Product created successfully"))
}

fn get_product_response<R>(
    repo: &R,
    logger: &InventoryLogger,
    product_id: i32,
) -> Result<HttpResponse, ProductApiError>
where
    R: ProductReader + ?Sized,
{
    let product = products::get_product(repo, logger, product_id)
        .inspect_err(|err| log_failure(logger, "fetch product", err))?;

    Ok(HttpResponse::Ok().json(product))
}

fn update_product_response<R>(
    repo: &R,
    logger: &InventoryLogger,
    product_id: i32,
    payload: UpdateProductPayload,
) -> Result<HttpResponse, ProductApiError>
where
    R: ProductReader + ProductWriter + ?Sized,
{
    let product = products::update_product(repo, logger, product_id, payload)
        .inspect_err(|err| log_failure(logger, "update product", err))?;

    Ok(HttpResponse::Ok().json(product))
}

fn delete_product_response<R>(
    repo: &R,
    logger: &InventoryLogger,
    product_id: i32,
) -> Result<HttpResponse, ProductApiError>
where
    R: ProductWriter + ?Sized,
{
    products::delete_product(repo, logger, product_id)
        .inspect_err(|err| log_failure(logger, "delete product", err))?;

    Ok(HttpResponse::Ok().json("Product deleted successfully"))
}
