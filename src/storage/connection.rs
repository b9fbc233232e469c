use crate::storage::entity::backup_schedule;
use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use std::time::Duration;

pub async fn establish_connection(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let in_memory = db_url.contains(":memory:");
    let mut opt = ConnectOptions::new(db_url.to_owned());
    // 内存库每个连接各自独立，只能用单连接
    opt.max_connections(if in_memory { 1 } else { 4 })
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Info);

    let db = Database::connect(opt).await?;

    // 启用 WAL 模式
    if !in_memory {
        let _ = db
            .execute(sea_orm::Statement::from_string(
                sea_orm::DatabaseBackend::Sqlite,
                "PRAGMA journal_mode=WAL;".to_string(),
            ))
            .await?;
    }

    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let stmt = builder.build(
        schema
            .create_table_from_entity(backup_schedule::Entity)
            .if_not_exists(),
    );
    db.execute(stmt).await?;

    info!("Database connection established ({}), schedule table ready.", db_url);
    Ok(db)
}
