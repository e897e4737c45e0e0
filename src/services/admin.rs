use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::pagination::Paginated;
use pushkind_common::routes::check_role;
use serde::{Deserialize, Deserializer, Serialize};

use crate::SERVICE_ACCESS_ROLE;
use crate::domain::product::{Product, ProductListQuery, ProductSort, ProductSortField};
use crate::forms::products::AdminProductForm;
use crate::logging::InventoryLogger;
use crate::repository::{ProductReader, ProductWriter};
use crate::services::{ServiceError, ServiceResult};

/// Rows shown per page in the admin product list.
pub const ADMIN_ITEMS_PER_PAGE: usize = 10;

/// Upper bound for requested pages; anything past the data clamps anyway.
const MAX_PAGE: usize = i32::MAX as usize;

/// Notices flashed when the save guard drops a write.
pub const GUARD_INFO_NOTICE: &str = "price and stock value must be greater than zero";
pub const GUARD_ERROR_NOTICE: &str = "Negative values can't be accepted";

/// Last-updated windows offered by the admin list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatedWithin {
    Today,
    Past7Days,
    ThisMonth,
    ThisYear,
}

impl UpdatedWithin {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "today" => Some(Self::Today),
            "past_7_days" => Some(Self::Past7Days),
            "this_month" => Some(Self::ThisMonth),
            "this_year" => Some(Self::ThisYear),
            _ => None,
        }
    }

    /// Value used for this window in query strings.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Past7Days => "past_7_days",
            Self::ThisMonth => "this_month",
            Self::ThisYear => "this_year",
        }
    }

    /// Start of the window relative to `now`.
    pub fn since(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        let start = match self {
            Self::Today => today,
            Self::Past7Days => today - Duration::days(7),
            Self::ThisMonth => today.with_day(1).unwrap_or(today),
            Self::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        };
        start.and_hms_opt(0, 0, 0).unwrap_or(now)
    }
}

/// Query parameters accepted by the admin product list.
#[derive(Debug, Default, Deserialize)]
pub struct AdminProductsQuery {
    /// Substring matched against name or description.
    pub search: Option<String>,
    /// Page requested by the UI (1-based).
    pub page: Option<usize>,
    /// Comma-separated ordering keys, `-` prefix for descending.
    pub o: Option<String>,
    /// Blank or unknown windows mean "any date".
    #[serde(default, deserialize_with = "deserialize_updated")]
    pub updated: Option<UpdatedWithin>,
}

fn deserialize_updated<'de, D>(deserializer: D) -> Result<Option<UpdatedWithin>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(str::trim).and_then(UpdatedWithin::from_key))
}

/// Row rendered in the admin product table.
#[derive(Debug, Serialize)]
pub struct AdminProductRow {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: i32,
    pub total_price: String,
    pub created_time: String,
    pub last_updated: String,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

impl From<Product> for AdminProductRow {
    fn from(product: Product) -> Self {
        let price = product.price().to_string();
        let total_price = product.total_price().to_string();
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price,
            stock: product.stock,
            total_price,
            created_time: product.created_time.format(TIMESTAMP_FORMAT).to_string(),
            last_updated: product.last_updated.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Data required to render the admin products template.
pub struct AdminProductsPageData {
    pub products: Paginated<AdminProductRow>,
    pub total_pages: usize,
    pub search: Option<String>,
    /// Normalized ordering keys echoed back to the view.
    pub ordering: String,
    pub updated: Option<UpdatedWithin>,
}

/// Result of an admin save attempt.
#[derive(Debug)]
pub enum AdminSaveOutcome {
    Saved(Product),
    /// The save guard dropped the write; nothing was persisted.
    Rejected,
}

fn default_ordering() -> Vec<ProductSort> {
    vec![
        ProductSort::asc(ProductSortField::Name),
        ProductSort::asc(ProductSortField::Stock),
    ]
}

fn parse_ordering(raw: Option<&str>) -> Vec<ProductSort> {
    let sort: Vec<ProductSort> = raw
        .unwrap_or_default()
        .split(',')
        .filter_map(ProductSort::parse)
        .collect();

    if sort.is_empty() {
        default_ordering()
    } else {
        sort
    }
}

fn format_ordering(sort: &[ProductSort]) -> String {
    sort.iter()
        .map(|clause| {
            if clause.descending {
                format!("-{}", clause.field.key())
            } else {
                clause.field.key().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Loads the admin products overview.
pub fn load_products_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    logger: &InventoryLogger,
    query: AdminProductsQuery,
) -> ServiceResult<AdminProductsPageData>
where
    R: ProductReader + ?Sized,
{
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let AdminProductsQuery {
        search,
        page,
        o,
        updated,
    } = query;

    let search = search
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty());
    let sort = parse_ordering(o.as_deref());

    let build_query = |page: usize| {
        let mut list_query = ProductListQuery::new().paginate(page, ADMIN_ITEMS_PER_PAGE);
        if let Some(term) = search.as_ref() {
            list_query = list_query.search(term);
        }
        if let Some(window) = updated {
            list_query = list_query.updated_since(window.since(chrono::Utc::now().naive_utc()));
        }
        for clause in &sort {
            list_query = list_query.order_by(*clause);
        }
        list_query
    };

    let mut page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let (mut total, mut items) = repo
        .list_products(build_query(page))
        .map_err(ServiceError::from)?;

    let total_pages = total.div_ceil(ADMIN_ITEMS_PER_PAGE).max(1);
    if page > total_pages {
        logger.scoped("admin").debug(format_args!(
            "page {page} is past the last page {total_pages}, clamping"
        ));
        page = total_pages;
        (total, items) = repo
            .list_products(build_query(page))
            .map_err(ServiceError::from)?;
    }

    let total_pages = total.div_ceil(ADMIN_ITEMS_PER_PAGE).max(1);
    let rows: Vec<AdminProductRow> = items.into_iter().map(AdminProductRow::from).collect();

    Ok(AdminProductsPageData {
        products: Paginated::new(rows, page, total_pages),
        total_pages,
        search,
        ordering: format_ordering(&sort),
        updated,
    })
}

/// Creates a product from the admin form, subject to the save guard.
pub fn create_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    logger: &InventoryLogger,
    form: AdminProductForm,
) -> ServiceResult<AdminSaveOutcome>
where
    R: ProductWriter + ?Sized,
{
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let logger = logger.scoped("admin");
    let values = form
        .parse()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    if !passes_save_guard(values.price_cents, values.stock) {
        logger.warn(format_args!(
            "rejected product save from {}: price_cents={} stock={}",
            user.email, values.price_cents, values.stock
        ));
        return Ok(AdminSaveOutcome::Rejected);
    }

    let created = repo
        .create_product(&values.into_new_product())
        .map_err(ServiceError::from)?;

    logger.info(format_args!("{} created product {}", user.email, created.id));
    Ok(AdminSaveOutcome::Saved(created))
}

/// Replaces the editable fields of a product from the admin form, subject to the save guard.
pub fn update_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    logger: &InventoryLogger,
    product_id: i32,
    form: AdminProductForm,
) -> ServiceResult<AdminSaveOutcome>
where
    R: ProductReader + ProductWriter + ?Sized,
{
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let logger = logger.scoped("admin");

    if repo
        .get_product_by_id(product_id)
        .map_err(ServiceError::from)?
        .is_none()
    {
        return Err(ServiceError::NotFound);
    }

    let values = form
        .parse()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    if !passes_save_guard(values.price_cents, values.stock) {
        logger.warn(format_args!(
            "rejected edit of product {product_id} from {}: price_cents={} stock={}",
            user.email, values.price_cents, values.stock
        ));
        return Ok(AdminSaveOutcome::Rejected);
    }

    let updated = repo
        .update_product(product_id, &values.into_update_product())
        .map_err(ServiceError::from)?;

    logger.info(format_args!("{} updated product {product_id}", user.email));
    Ok(AdminSaveOutcome::Saved(updated))
}

/// Deletes a product from the admin panel.
pub fn delete_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    logger: &InventoryLogger,
    product_id: i32,
) -> ServiceResult<()>
where
    R: ProductWriter + ?Sized,
{
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    repo.delete_product(product_id).map_err(ServiceError::from)?;

    logger
        .scoped("admin")
        .info(format_args!("{} deleted product {product_id}", user.email));
    Ok(())
}

fn passes_save_guard(price_cents: i64, stock: i32) -> bool {
    price_cents > 0 && stock > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use actix_web::web;
    use pushkind_common::repository::errors::RepositoryError;
    use serde_json::Value;

    use crate::repository::mock::{MockProductReader, MockProductRepository, MockProductWriter};

    fn datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    fn user_with_roles(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "user-1".to_string(),
            email: "admin@example.com".to_string(),
            hub_id: 1,
            name: "Admin".to_string(),
            roles: roles.iter().map(|role| (*role).to_string()).collect(),
            exp: 0,
        }
    }

    fn sample_product(id: i32, price_cents: i64, stock: i32) -> Product {
        Product {
            id,
            name: format!("Product {id}"),
            description: String::new(),
            price_cents,
            stock,
            created_time: datetime(),
            last_updated: datetime(),
        }
    }

    fn form(price: &str, stock: &str) -> AdminProductForm {
        AdminProductForm {
            name: "Chair".to_string(),
            description: "Oak".to_string(),
            price: price.to_string(),
            stock: stock.to_string(),
        }
    }

    #[test]
    fn updated_within_computes_window_start() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 15)
            .and_then(|date| date.and_hms_opt(13, 45, 0))
            .expect("valid timestamp");
        let midnight = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .expect("valid timestamp")
        };

        assert_eq!(UpdatedWithin::Today.since(now), midnight(2024, 5, 15));
        assert_eq!(UpdatedWithin::Past7Days.since(now), midnight(2024, 5, 8));
        assert_eq!(UpdatedWithin::ThisMonth.since(now), midnight(2024, 5, 1));
        assert_eq!(UpdatedWithin::ThisYear.since(now), midnight(2024, 1, 1));
    }

    #[test]
    fn query_string_with_blank_filters_parses() {
        let query = web::Query::<AdminProductsQuery>::from_query("search=&updated=&o=name&page=2")
            .expect("blank filters are accepted")
            .into_inner();

        assert_eq!(query.search.as_deref(), Some(""));
        assert_eq!(query.updated, None);
        assert_eq!(query.o.as_deref(), Some("name"));
        assert_eq!(query.page, Some(2));

        let query = web::Query::<AdminProductsQuery>::from_query("updated=past_7_days")
            .expect("known window")
            .into_inner();
        assert_eq!(query.updated, Some(UpdatedWithin::Past7Days));

        let query = web::Query::<AdminProductsQuery>::from_query("updated=someday")
            .expect("unknown window is ignored")
            .into_inner();
        assert_eq!(query.updated, None);

        let query = web::Query::<AdminProductsQuery>::from_query("")
            .expect("no params")
            .into_inner();
        assert_eq!(query.updated, None);
        assert_eq!(query.page, None);
    }

    #[test]
    fn load_products_page_caps_huge_page_numbers() {
        let mut repo = MockProductReader::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);

        repo.expect_list_products()
            .times(2)
            .withf(|qry| {
                let page = qry.pagination.as_ref().map(|p| p.page).unwrap_or(0);
                page <= MAX_PAGE
            })
            .returning(|_| Ok((3, vec![sample_product(1, 100, 1)])));

        let query = AdminProductsQuery {
            page: Some(usize::MAX),
            ..Default::default()
        };

        let data = load_products_page(&repo, &user, &InventoryLogger::default(), query)
            .expect("expected success");
        assert_eq!(data.total_pages, 1);
    }

    #[test]
    fn parse_ordering_falls_back_to_name_and_stock() {
        assert_eq!(parse_ordering(None), default_ordering());
        assert_eq!(parse_ordering(Some("bogus,")), default_ordering());
        assert_eq!(
            parse_ordering(Some("-price,name")),
            vec![
                ProductSort::desc(ProductSortField::Price),
                ProductSort::asc(ProductSortField::Name),
            ]
        );
        assert_eq!(format_ordering(&parse_ordering(Some("-price, stock"))), "-price,stock");
    }

    #[test]
    fn load_products_page_requires_role() {
        let repo = MockProductReader::new();
        let user = user_with_roles(&[]);

        let result = load_products_page(
            &repo,
            &user,
            &InventoryLogger::default(),
            AdminProductsQuery::default(),
        );

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn load_products_page_returns_rows_with_total_price() {
        let mut repo = MockProductReader::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);

        repo.expect_list_products()
            .times(1)
            .withf(|qry| {
                assert_eq!(qry.search.as_deref(), Some("chair"));
                assert!(qry.updated_since.is_some());
                assert_eq!(qry.sort, default_ordering());
                match &qry.pagination {
                    Some(pagination) => {
                        assert_eq!(pagination.page, 1);
                        assert_eq!(pagination.per_page, ADMIN_ITEMS_PER_PAGE);
                    }
                    None => panic!("expected pagination to be set"),
                }
                true
            })
            .returning(|_| Ok((1, vec![sample_product(1, 1250, 4)])));

        let query = AdminProductsQuery {
            search: Some("  chair ".to_string()),
            page: None,
            o: None,
            updated: Some(UpdatedWithin::ThisYear),
        };

        let data = load_products_page(&repo, &user, &InventoryLogger::default(), query)
            .expect("expected success");

        assert_eq!(data.search.as_deref(), Some("chair"));
        assert_eq!(data.ordering, "name,stock");

        let serialized = serde_json::to_value(&data.products).expect("serialization");
        let items = serialized
            .get("items")
            .and_then(Value::as_array)
            .expect("items array");
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].get("total_price").and_then(Value::as_str),
            Some("50.00")
        );
        assert_eq!(items[0].get("price").and_then(Value::as_str), Some("12.50"));
        assert_eq!(
            items[0].get("created_time").and_then(Value::as_str),
            Some("2024-01-01 00:00")
        );
    }

    #[test]
    fn load_products_page_clamps_to_last_page() {
        let mut repo = MockProductReader::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);

        repo.expect_list_products()
            .times(2)
            .returning(|qry| {
                let page = qry.pagination.as_ref().map(|p| p.page).unwrap_or(1);
                if page == 2 {
                    Ok((12, vec![sample_product(11, 100, 1), sample_product(12, 100, 1)]))
                } else {
                    Ok((12, Vec::new()))
                }
            });

        let query = AdminProductsQuery {
            page: Some(9),
            ..Default::default()
        };

        let data = load_products_page(&repo, &user, &InventoryLogger::default(), query)
            .expect("expected success");

        assert_eq!(data.total_pages, 2);
        let serialized = serde_json::to_value(&data.products).expect("serialization");
        assert_eq!(serialized.get("page").and_then(Value::as_u64), Some(2));
    }

    #[test]
    fn create_product_guard_drops_non_positive_values() {
        let repo = MockProductWriter::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);

        let logger = InventoryLogger::default();

        for (price, stock) in [("0", "3"), ("-5", "3"), ("5", "0"), ("5", "-1")] {
            let outcome = create_product(&repo, &user, &logger, form(price, stock))
                .expect("guard does not raise");
            assert!(matches!(outcome, AdminSaveOutcome::Rejected));
        }
    }

    #[test]
    fn create_product_persists_positive_values() {
        let mut repo = MockProductWriter::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);

        repo.expect_create_product()
            .times(1)
            .withf(|new_product| {
                assert_eq!(new_product.name, "Chair");
                assert_eq!(new_product.price_cents, 4999);
                assert_eq!(new_product.stock, 2);
                true
            })
            .returning(|_| Ok(sample_product(5, 4999, 2)));

        let outcome = create_product(&repo, &user, &InventoryLogger::default(), form("49.99", "2"))
            .expect("expected success");

        assert!(matches!(outcome, AdminSaveOutcome::Saved(product) if product.id == 5));
    }

    #[test]
    fn create_product_reports_form_errors() {
        let repo = MockProductWriter::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);

        let result = create_product(&repo, &user, &InventoryLogger::default(), form("abc", "2"));

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn update_product_requires_existing_product() {
        let mut repo = MockProductRepository::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);
        repo.reader
            .expect_get_product_by_id()
            .returning(|_| Ok(None));

        let result = update_product(&repo, &user, &InventoryLogger::default(), 3, form("1", "1"));

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn update_product_guard_keeps_stored_values() {
        let mut repo = MockProductRepository::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);
        repo.reader
            .expect_get_product_by_id()
            .returning(|id| Ok(Some(sample_product(id, 100, 1))));
        repo.writer.expect_update_product().never();

        let outcome = update_product(&repo, &user, &InventoryLogger::default(), 3, form("1", "0"))
            .expect("guard does not raise");

        assert!(matches!(outcome, AdminSaveOutcome::Rejected));
    }

    #[test]
    fn update_product_writes_every_field() {
        let mut repo = MockProductRepository::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);
        repo.reader
            .expect_get_product_by_id()
            .returning(|id| Ok(Some(sample_product(id, 100, 1))));
        repo.writer
            .expect_update_product()
            .times(1)
            .withf(|product_id, updates| {
                assert_eq!(*product_id, 3);
                assert_eq!(updates.name.as_deref(), Some("Chair"));
                assert_eq!(updates.description.as_deref(), Some("Oak"));
                assert_eq!(updates.price_cents, Some(250));
                assert_eq!(updates.stock, Some(7));
                true
            })
            .returning(|id, _| Ok(sample_product(id, 250, 7)));

        let logger = InventoryLogger::default();
        let outcome = update_product(&repo, &user, &logger, 3, form("2.50", "7"))
            .expect("expected success");

        assert!(matches!(outcome, AdminSaveOutcome::Saved(_)));
    }

    #[test]
    fn delete_product_requires_role() {
        let repo = MockProductWriter::new();
        let user = user_with_roles(&["viewer"]);

        let result = delete_product(&repo, &user, &InventoryLogger::default(), 1);

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn delete_product_maps_missing_row() {
        let mut repo = MockProductWriter::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);
        repo.expect_delete_product()
            .returning(|_| Err(RepositoryError::NotFound));

        let result = delete_product(&repo, &user, &InventoryLogger::default(), 1);

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }
}
