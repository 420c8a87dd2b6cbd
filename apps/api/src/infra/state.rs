use crate::config::db::DbProfile;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;

/// Builder for `AppState`, shared by `main` and the test suite.
pub struct StateBuilder {
    security_config: Option<SecurityConfig>,
    db_profile: Option<DbProfile>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            security_config: None,
            db_profile: None,
        }
    }

    pub fn with_db(mut self, profile: DbProfile) -> Self {
        self.db_profile = Some(profile);
        self
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = Some(security_config);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let security = self
            .security_config
            .ok_or_else(|| AppError::config("security config is required".to_string()))?;

        if let Some(profile) = self.db_profile {
            // single entrypoint: connect + migrate
            let conn = bootstrap_db(profile).await?;
            Ok(AppState::new(conn, security))
        } else {
            Ok(AppState::new_without_db(security))
        }
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_without_security_fails() {
        let result = build_state().build().await;
        assert!(matches!(result, Err(AppError::Config { .. })));
    }

    #[tokio::test]
    async fn build_without_db_option_has_no_db() {
        let state = build_state()
            .with_security(SecurityConfig::new(b"test".to_vec()))
            .build()
            .await
            .unwrap();
        assert!(state.db().is_none());
    }
}
