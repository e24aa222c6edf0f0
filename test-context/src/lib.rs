#![allow(clippy::expect_used)]

use layerdb_common as common;
use layerdb_common::db;
use postgresql_embedded::PostgreSQL;
use sea_orm::{ConnectionTrait, FromQueryResult, Statement};
use std::env;
use test_context::AsyncTestContext;
use tracing::instrument;

#[allow(dead_code)]
pub struct LayerdbContext {
    pub db: db::Database,
    postgresql: Option<PostgreSQL>,
}

impl LayerdbContext {
    fn new(db: db::Database, postgresql: impl Into<Option<PostgreSQL>>) -> Self {
        Self {
            db,
            postgresql: postgresql.into(),
        }
    }

    /// Run plain SQL, without parameters.
    pub async fn execute(&self, sql: &str) -> Result<u64, anyhow::Error> {
        Ok(self.db.execute_unprepared(sql).await?.rows_affected())
    }

    /// Check if a column exists in the current schema.
    pub async fn has_column(&self, table: &str, column: &str) -> Result<bool, anyhow::Error> {
        self.exists(
            "SELECT EXISTS (SELECT 1 FROM information_schema.columns WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2) AS found",
            [table.into(), column.into()],
        )
        .await
    }

    /// Check if a table exists in the current schema.
    pub async fn has_table(&self, table: &str) -> Result<bool, anyhow::Error> {
        self.exists(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = $1) AS found",
            [table.into()],
        )
        .await
    }

    async fn exists(
        &self,
        sql: &str,
        values: impl IntoIterator<Item = sea_orm::Value>,
    ) -> Result<bool, anyhow::Error> {
        #[derive(FromQueryResult)]
        struct Exists {
            found: bool,
        }

        let stmt = Statement::from_sql_and_values(self.db.get_database_backend(), sql, values);
        Ok(Exists::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .is_some_and(|exists| exists.found))
    }
}

impl AsyncTestContext for LayerdbContext {
    #[instrument]
    #[allow(clippy::expect_used)]
    async fn setup() -> LayerdbContext {
        if env::var("EXTERNAL_TEST_DB").is_ok() {
            log::warn!("Using external database from 'DB_*' env vars");
            let config = common::config::Database::from_env().expect("DB config from env");

            let db = if env::var("EXTERNAL_TEST_DB_BOOTSTRAP").is_ok() {
                db::Database::bootstrap(&config).await
            } else {
                db::Database::new(&config).await
            }
            .expect("Configuring the database");

            return LayerdbContext::new(db, None);
        }

        let (db, postgresql) = db::embedded::create()
            .await
            .expect("Create an embedded database");

        LayerdbContext::new(db, postgresql)
    }

    async fn teardown(self) {
        if let Err(err) = self.db.close().await {
            log::warn!("failed to close the test database: {err}");
        }
    }
}
