pub use pushkind_common::services::errors::{ServiceError, ServiceResult};

pub mod admin;
pub mod products;
