pub mod domain;
pub mod forms;
pub mod logging;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;

/// Role required to use the admin panel.
pub const SERVICE_ACCESS_ROLE: &str = "admin";
