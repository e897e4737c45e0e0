use diesel::prelude::*;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::product::{
        NewProduct as DomainNewProduct, Product as DomainProduct, ProductListQuery,
        ProductSortField, UpdateProduct as DomainUpdateProduct,
    },
    models::product::{
        NewProduct as DbNewProduct, Product as DbProduct, UpdateProduct as DbUpdateProduct,
    },
    repository::{DieselRepository, ProductReader, ProductWriter},
};

impl ProductReader for DieselRepository {
    fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let product = products::table
            .find(id)
            .first::<DbProduct>(&mut conn)
            .optional()?;

        Ok(product.map(Into::into))
    }

    fn list_products(
        &self,
        query: ProductListQuery,
    ) -> RepositoryResult<(usize, Vec<DomainProduct>)> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = products::table.into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(term) = query.search.as_ref() {
                let pattern = like_pattern(term);
                items = items.filter(
                    products::name
                        .like(pattern.clone())
                        .escape('\\')
                        .or(products::description.like(pattern).escape('\\')),
                );
            }

            if let Some(cents) = query.price_above_cents {
                items = items.filter(products::price_cents.gt(cents));
            }

            if let Some(cents) = query.price_below_cents {
                items = items.filter(products::price_cents.lt(cents));
            }

            if let Some(since) = query.updated_since {
                items = items.filter(products::last_updated.ge(since));
            }

            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();

        for sort in &query.sort {
            items = match (sort.field, sort.descending) {
                (ProductSortField::Name, false) => items.then_order_by(products::name.asc()),
                (ProductSortField::Name, true) => items.then_order_by(products::name.desc()),
                (ProductSortField::Price, false) => {
                    items.then_order_by(products::price_cents.asc())
                }
                (ProductSortField::Price, true) => {
                    items.then_order_by(products::price_cents.desc())
                }
                (ProductSortField::Stock, false) => items.then_order_by(products::stock.asc()),
                (ProductSortField::Stock, true) => items.then_order_by(products::stock.desc()),
                (ProductSortField::CreatedTime, false) => {
                    items.then_order_by(products::created_time.asc())
                }
                (ProductSortField::CreatedTime, true) => {
                    items.then_order_by(products::created_time.desc())
                }
                (ProductSortField::LastUpdated, false) => {
                    items.then_order_by(products::last_updated.asc())
                }
                (ProductSortField::LastUpdated, true) => {
                    items.then_order_by(products::last_updated.desc())
                }
            };
        }
        items = items.then_order_by(products::id.asc());

        if let Some(pagination) = &query.pagination {
            let offset = (pagination.page.max(1) - 1).saturating_mul(pagination.per_page);
            let offset = i64::try_from(offset).unwrap_or(i64::MAX);
            let limit = i64::try_from(pagination.per_page).unwrap_or(i64::MAX);
            items = items.offset(offset).limit(limit);
        }

        let db_products = items.load::<DbProduct>(&mut conn)?;

        Ok((total, db_products.into_iter().map(Into::into).collect()))
    }
}

impl ProductWriter for DieselRepository {
    fn create_product(&self, new_product: &DomainNewProduct) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_new = DbNewProduct::from(new_product);

        let created = diesel::insert_into(products::table)
            .values(&db_new)
            .get_result::<DbProduct>(&mut conn)?;

        Ok(created.into())
    }

    fn update_product(
        &self,
        product_id: i32,
        updates: &DomainUpdateProduct,
    ) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_updates = DbUpdateProduct::from(updates);

        let updated = diesel::update(products::table.find(product_id))
            .set(&db_updates)
            .get_result::<DbProduct>(&mut conn)?;

        Ok(updated.into())
    }

    fn delete_product(&self, product_id: i32) -> RepositoryResult<()> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let deleted = diesel::delete(products::table.find(product_id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Substring pattern for `LIKE` with `\` as the escape character.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
