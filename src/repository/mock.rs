use mockall::mock;

use super::{ProductReader, ProductWriter};
use crate::domain::product::{NewProduct, Product, ProductListQuery, UpdateProduct};
use pushkind_common::repository::errors::RepositoryResult;

mock! {
    pub ProductReader {}

    impl ProductReader for ProductReader {
        fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>>;
        fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
    }
}

mock! {
    pub ProductWriter {}

    impl ProductWriter for ProductWriter {
        fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
        fn update_product(&self, product_id: i32, updates: &UpdateProduct) -> RepositoryResult<Product>;
        fn delete_product(&self, product_id: i32) -> RepositoryResult<()>;
    }
}

/// Combined reader/writer used by service tests that need both sides.
pub struct MockProductRepository {
    pub reader: MockProductReader,
    pub writer: MockProductWriter,
}

impl MockProductRepository {
    pub fn new() -> Self {
        Self {
            reader: MockProductReader::new(),
            writer: MockProductWriter::new(),
        }
    }
}

impl ProductReader for MockProductRepository {
    fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>> {
        self.reader.get_product_by_id(id)
    }

    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)> {
        self.reader.list_products(query)
    }
}

impl ProductWriter for MockProductRepository {
    fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product> {
        self.writer.create_product(new_product)
    }

    fn update_product(
        &self,
        product_id: i32,
        updates: &UpdateProduct,
    ) -> RepositoryResult<Product> {
        self.writer.update_product(product_id, updates)
    }

    fn delete_product(&self, product_id: i32) -> RepositoryResult<()> {
        self.writer.delete_product(product_id)
    }
}
