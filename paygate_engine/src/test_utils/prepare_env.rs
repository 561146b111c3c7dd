use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{OrderFlowApi, OrderFlowConfig, SqliteDatabase};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

/// A fresh SQLite file in the system temp directory.
pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/paygate_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 1).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    db.pool().close().await;
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// Creates a migrated database at a random path and an order flow on top of it.
pub async fn prepare_test_api(config: OrderFlowConfig) -> OrderFlowApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    OrderFlowApi::new(db, config)
}

pub async fn tear_down(api: OrderFlowApi<SqliteDatabase>) {
    use crate::traits::OrderManagement;
    let url = api.db().url().to_string();
    api.db().pool().close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("Could not remove test database {url}: {e}");
    }
}
