//! Relational store for the access-propagation engine
//!
//! Entity definitions, schema migrations, and connection helpers. All
//! derived membership rows in `team_members` are owned by the engine
//! crate; nothing here writes them.

pub mod entities;
pub mod migrator;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

pub use migrator::Migrator;

/// Connect to the database at `url`.
///
/// Accepts any SeaORM-supported URL, e.g. `sqlite::memory:`,
/// `sqlite://teamgrid.db?mode=rwc`, or `postgres://…`.
pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url.to_string());
    options.sqlx_logging(false);

    let db = Database::connect(options).await?;
    debug!(backend = ?db.get_database_backend(), "connected to database");

    Ok(db)
}

/// Apply all pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db, None).await?;
    info!("database schema is up to date");

    Ok(())
}
