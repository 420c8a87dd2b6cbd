pub use sea_orm_migration::prelude::*;
pub use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};

mod m20250827_000001_create_users; // keep filename + module name in sync

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250827_000001_create_users::Migration)]
    }
}

/// Apply all pending migrations.
///
/// Single entrypoint shared by server startup and tests so both run the
/// exact same schema.
pub async fn migrate_up(db: &DatabaseConnection) -> Result<(), DbErr> {
    let pending = Migrator::get_pending_migrations(db).await?.len();
    tracing::info!(pending, "running migrations");
    Migrator::up(db, None).await?;
    tracing::info!("migrations applied");
    Ok(())
}
