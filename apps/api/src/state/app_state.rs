use sea_orm::DatabaseConnection;

use super::security_config::SecurityConfig;

/// Shared application state handed to every handler and extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database connection (absent in unit-test scenarios)
    db: Option<DatabaseConnection>,
    /// Token signing configuration
    pub security: SecurityConfig,
}

impl AppState {
    pub fn new(db: DatabaseConnection, security: SecurityConfig) -> Self {
        Self {
            db: Some(db),
            security,
        }
    }

    pub fn new_without_db(security: SecurityConfig) -> Self {
        Self { db: None, security }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }
}
