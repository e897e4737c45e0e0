use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages, Level};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{base_context, redirect, render_template};
use serde::Serialize;
use tera::Tera;

use crate::forms::products::AdminProductForm;
use crate::logging::InventoryLogger;
use crate::repository::DieselRepository;
use crate::services::ServiceError;
use crate::services::admin::{
    self as admin_service, AdminProductsQuery, AdminSaveOutcome, GUARD_ERROR_NOTICE,
    GUARD_INFO_NOTICE,
};

const PRODUCTS_URL: &str = "/admin/products";

/// Flash notice prepared for the template.
#[derive(Serialize)]
struct Notice {
    level: &'static str,
    content: String,
}

fn notices(flash_messages: &IncomingFlashMessages) -> Vec<Notice> {
    flash_messages
        .iter()
        .map(|message| Notice {
            level: match message.level() {
                Level::Error => "danger",
                Level::Warning => "warning",
                Level::Success => "success",
                _ => "info",
            },
            content: message.content().to_string(),
        })
        .collect()
}

fn reject_save() -> HttpResponse {
    FlashMessage::info(GUARD_INFO_NOTICE).send();
    FlashMessage::error(GUARD_ERROR_NOTICE).send();
    redirect(PRODUCTS_URL)
}

fn forbidden() -> HttpResponse {
    FlashMessage::error("Insufficient permissions.").send();
    redirect("/na")
}

#[get("/products")]
pub async fn show_products(
    params: web::Query<AdminProductsQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    logger: web::Data<InventoryLogger>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match admin_service::load_products_page(repo.get_ref(), &user, &logger, params.into_inner()) {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                &user,
                "products",
                &server_config.auth_service_url,
            );
            context.insert("notices", &notices(&flash_messages));
            context.insert("products", &data.products);
            context.insert("total_pages", &data.total_pages);
            context.insert("search", &data.search.unwrap_or_default());
            context.insert("ordering", &data.ordering);
            context.insert(
                "updated",
                data.updated.map(|window| window.key()).unwrap_or_default(),
            );
            render_template(&tera, "admin/products.html", &context)
        }
        Err(ServiceError::Unauthorized) => forbidden(),
        Err(err) => {
            logger.error(format_args!("Failed to list products: {err}"));
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/products/add")]
pub async fn add_product(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    logger: web::Data<InventoryLogger>,
    web::Form(form): web::Form<AdminProductForm>,
) -> impl Responder {
    match admin_service::create_product(repo.get_ref(), &user, &logger, form) {
        Ok(AdminSaveOutcome::Saved(product)) => {
            FlashMessage::success(format!("Product «{}» added.", product.name)).send();
            redirect(PRODUCTS_URL)
        }
        Ok(AdminSaveOutcome::Rejected) => reject_save(),
        Err(ServiceError::Unauthorized) => forbidden(),
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(PRODUCTS_URL)
        }
        Err(err) => {
            logger.error(format_args!("Failed to create product: {err}"));
            FlashMessage::error("Failed to add the product.").send();
            redirect(PRODUCTS_URL)
        }
    }
}

#[post("/products/{product_id}/edit")]
pub async fn edit_product(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    logger: web::Data<InventoryLogger>,
    web::Form(form): web::Form<AdminProductForm>,
) -> impl Responder {
    let product_id = path.into_inner();

    match admin_service::update_product(repo.get_ref(), &user, &logger, product_id, form) {
        Ok(AdminSaveOutcome::Saved(product)) => {
            FlashMessage::success(format!("Product «{}» updated.", product.name)).send();
            redirect(PRODUCTS_URL)
        }
        Ok(AdminSaveOutcome::Rejected) => reject_save(),
        Err(ServiceError::Unauthorized) => forbidden(),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found.").send();
            redirect(PRODUCTS_URL)
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(PRODUCTS_URL)
        }
        Err(err) => {
            logger.error(format_args!("Failed to update product {product_id}: {err}"));
            FlashMessage::error("Failed to update the product.").send();
            redirect(PRODUCTS_URL)
        }
    }
}

#[post("/products/{product_id}/delete")]
pub async fn delete_product(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    logger: web::Data<InventoryLogger>,
) -> impl Responder {
    let product_id = path.into_inner();

    match admin_service::delete_product(repo.get_ref(), &user, &logger, product_id) {
        Ok(()) => {
            FlashMessage::success("Product deleted.").send();
            redirect(PRODUCTS_URL)
        }
        Err(ServiceError::Unauthorized) => forbidden(),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found or already deleted.").send();
            redirect(PRODUCTS_URL)
        }
        Err(err) => {
            logger.error(format_args!("Failed to delete product {product_id}: {err}"));
            FlashMessage::error("Failed to delete the product.").send();
            redirect(PRODUCTS_URL)
        }
    }
}
