//! Logger handle passed to handlers and services instead of relying on a
//! process-wide logger name.

use std::fmt;

use log::Level;

/// Root log target for the inventory service.
pub const ROOT_TARGET: &str = "inventory";

/// Explicitly injected logger that tags every record with a target.
#[derive(Debug, Clone)]
pub struct InventoryLogger {
    target: String,
}

impl Default for InventoryLogger {
    fn default() -> Self {
        Self::new(ROOT_TARGET)
    }
}

impl InventoryLogger {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Derive a logger for a nested scope, e.g. `inventory::products`.
    pub fn scoped(&self, scope: &str) -> Self {
        Self {
            target: format!("{}::{scope}", self.target),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(target: self.target.as_str(), level, "{args}");
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }
}
