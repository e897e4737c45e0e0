use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::price::cents_to_price;

/// Domain representation of an inventory product.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Product {
    /// Unique identifier generated by the store.
    pub id: i32,
    /// Short human-readable label.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Price represented in cents.
    pub price_cents: i64,
    /// Number of units in stock.
    pub stock: i32,
    /// Timestamp for when the product record was created.
    pub created_time: NaiveDateTime,
    /// Timestamp for the last mutation of the product record.
    pub last_updated: NaiveDateTime,
}

impl Product {
    /// Price as a fixed-point decimal.
    pub fn price(&self) -> Decimal {
        cents_to_price(self.price_cents)
    }

    /// Value of the units on hand (`price * stock`).
    pub fn total_price(&self) -> Decimal {
        self.price() * Decimal::from(self.stock)
    }
}

/// Payload required to insert a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i32,
    /// Creation timestamp, also used as the initial `last_updated`.
    pub created_time: NaiveDateTime,
}

impl NewProduct {
    /// Build a new product payload stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price_cents: i64,
        stock: i32,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            name: name.into(),
            description: description.into(),
            price_cents,
            stock,
            created_time: now,
        }
    }
}

/// Patch data applied when updating an existing product.
///
/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i32>,
    /// Timestamp captured when the patch was created.
    pub last_updated: NaiveDateTime,
}

impl Default for UpdateProduct {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateProduct {
    /// Create a new patch object with no changes applied yet.
    pub fn new() -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            name: None,
            description: None,
            price_cents: None,
            stock: None,
            last_updated: now,
        }
    }

    /// Update the product name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Update the product description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Update the product price.
    pub fn price_cents(mut self, price_cents: i64) -> Self {
        self.price_cents = Some(price_cents);
        self
    }

    /// Update the stock count.
    pub fn stock(mut self, stock: i32) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Whether the patch touches none of the editable fields.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price_cents.is_none()
            && self.stock.is_none()
    }
}

/// Columns a product listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortField {
    Name,
    Price,
    Stock,
    CreatedTime,
    LastUpdated,
}

impl ProductSortField {
    /// Resolve an ordering key such as `price` or `last_updated`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            "stock" => Some(Self::Stock),
            "created_time" => Some(Self::CreatedTime),
            "last_updated" => Some(Self::LastUpdated),
            _ => None,
        }
    }

    /// Key used in query strings for this column.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Stock => "stock",
            Self::CreatedTime => "created_time",
            Self::LastUpdated => "last_updated",
        }
    }
}

/// A single ordering clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSort {
    pub field: ProductSortField,
    pub descending: bool,
}

impl ProductSort {
    pub fn asc(field: ProductSortField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn desc(field: ProductSortField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    /// Parse a key with an optional `-` prefix for descending order.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match value.strip_prefix('-') {
            Some(key) => ProductSortField::from_key(key).map(Self::desc),
            None => ProductSortField::from_key(value).map(Self::asc),
        }
    }
}

/// Query definition used to list products.
#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    /// Optional substring matched against name or description.
    pub search: Option<String>,
    /// Only products priced strictly above this many cents.
    pub price_above_cents: Option<i64>,
    /// Only products priced strictly below this many cents.
    pub price_below_cents: Option<i64>,
    /// Only products updated at or after this moment.
    pub updated_since: Option<NaiveDateTime>,
    /// Ordering clauses applied in sequence; ties fall back to the id.
    pub sort: Vec<ProductSort>,
    /// Optional pagination options applied to the query.
    pub pagination: Option<Pagination>,
}

impl ProductListQuery {
    /// Construct a query that targets every product.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter the results by a search term applied to the name or description.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Keep products priced strictly above `cents`.
    pub fn price_above(mut self, cents: i64) -> Self {
        self.price_above_cents = Some(cents);
        self
    }

    /// Keep products priced strictly below `cents`.
    pub fn price_below(mut self, cents: i64) -> Self {
        self.price_below_cents = Some(cents);
        self
    }

    /// Keep products updated at or after `since`.
    pub fn updated_since(mut self, since: NaiveDateTime) -> Self {
        self.updated_since = Some(since);
        self
    }

    /// Append an ordering clause.
    pub fn order_by(mut self, sort: ProductSort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}
