pub mod embedded;

use anyhow::{Context, ensure};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    AccessMode, ConnectOptions, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, DbErr, ExecResult, IsolationLevel, QueryResult, Statement, TransactionError,
    TransactionTrait,
};
use std::{
    ops::{Deref, DerefMut},
    pin::Pin,
    time::Duration,
};
use tracing::instrument;
use url::Url;

/// **NOTE**: Not `Clone`. The unit tests of the migration crate enable sea-orm's `mock` feature,
/// which makes `DatabaseConnection` non-clone for the whole workspace.
#[derive(Debug)]
pub struct Database {
    /// the database connection
    db: DatabaseConnection,
    /// the database name
    name: String,
}

impl Database {
    #[instrument(err)]
    pub async fn new(database: &crate::config::Database) -> Result<Self, anyhow::Error> {
        let url = database.to_url();

        if log::log_enabled!(log::Level::Debug) {
            log::debug!("connect to {}", strip_password(url.clone()));
        }

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(database.max_conn);
        opt.min_connections(database.min_conn);
        opt.sqlx_logging_level(log::LevelFilter::Trace);

        opt.connect_timeout(Duration::from_secs(database.connect_timeout));
        opt.acquire_timeout(Duration::from_secs(database.acquire_timeout));
        opt.max_lifetime(Duration::from_secs(database.max_lifetime));
        opt.idle_timeout(Duration::from_secs(database.idle_timeout));

        let db = sea_orm::Database::connect(opt).await?;
        let name = database.name.clone();

        Ok(Self { db, name })
    }

    /// Apply pending migrations, all of them if `steps` is `None`.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self, steps: Option<u32>) -> Result<(), anyhow::Error> {
        log::debug!("applying migrations");
        Migrator::up(&self.db, steps).await?;
        log::debug!("applied migrations");

        Ok(())
    }

    /// Roll back applied migrations, all of them if `steps` is `None`.
    #[instrument(skip(self), err)]
    pub async fn rollback(&self, steps: Option<u32>) -> Result<(), anyhow::Error> {
        log::warn!("rolling back migrations");
        Migrator::down(&self.db, steps).await?;
        log::warn!("rolled back migrations");

        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn refresh(&self) -> Result<(), anyhow::Error> {
        log::warn!("refreshing database schema...");
        Migrator::refresh(&self.db).await?;
        log::warn!("refreshing database schema... done!");

        Ok(())
    }

    /// Names of the applied migrations, in order.
    pub async fn applied(&self) -> Result<Vec<String>, anyhow::Error> {
        Ok(Migrator::get_applied_migrations(&self.db)
            .await?
            .iter()
            .map(|migration| migration.name().to_string())
            .collect())
    }

    /// Names of the pending migrations, in order.
    pub async fn pending(&self) -> Result<Vec<String>, anyhow::Error> {
        Ok(Migrator::get_pending_migrations(&self.db)
            .await?
            .iter()
            .map(|migration| migration.name().to_string())
            .collect())
    }

    /// Drop and re-create the database, then apply all migrations.
    #[instrument(err)]
    pub async fn bootstrap(database: &crate::config::Database) -> Result<Self, anyhow::Error> {
        ensure!(
            database.url.is_none(),
            "Unable to bootstrap database with '--db-url'"
        );

        let url = crate::config::Database {
            name: "postgres".into(),
            ..database.clone()
        }
        .to_url();

        log::debug!("bootstrap to {}", strip_password(url.clone()));
        let db = sea_orm::Database::connect(url).await?;

        db.execute(Statement::from_string(
            db.get_database_backend(),
            format!("DROP DATABASE IF EXISTS \"{}\";", database.name),
        ))
        .await?;

        db.execute(Statement::from_string(
            db.get_database_backend(),
            format!("CREATE DATABASE \"{}\";", database.name),
        ))
        .await?;
        db.close().await?;

        let db = Self::new(database).await?;
        db.migrate(None).await?;

        Ok(db)
    }

    #[instrument(skip(self), err)]
    pub async fn close(self) -> anyhow::Result<()> {
        Ok(self.db.close().await?)
    }

    /// Ping the database.
    #[instrument(skip(self), err)]
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.db
            .ping()
            .await
            .context("failed to ping the database")?;
        Ok(())
    }

    /// Get the name of the database
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Deref for Database {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl DerefMut for Database {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.db
    }
}

#[async_trait::async_trait]
impl ConnectionTrait for Database {
    fn get_database_backend(&self) -> DbBackend {
        self.db.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        self.db.execute(stmt).await
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        self.db.execute_unprepared(sql).await
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        self.db.query_one(stmt).await
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        self.db.query_all(stmt).await
    }

    fn support_returning(&self) -> bool {
        self.db.support_returning()
    }
}

#[async_trait::async_trait]
impl TransactionTrait for Database {
    async fn begin(&self) -> Result<DatabaseTransaction, DbErr> {
        self.db.begin().await
    }

    async fn begin_with_config(
        &self,
        isolation_level: Option<IsolationLevel>,
        access_mode: Option<AccessMode>,
    ) -> Result<DatabaseTransaction, DbErr> {
        self.db
            .begin_with_config(isolation_level, access_mode)
            .await
    }

    async fn transaction<F, T, E>(&self, callback: F) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>
            + Send,
        T: Send,
        E: std::fmt::Display + std::fmt::Debug + Send,
    {
        self.db.transaction(callback).await
    }

    async fn transaction_with_config<F, T, E>(
        &self,
        callback: F,
        isolation_level: Option<IsolationLevel>,
        access_mode: Option<AccessMode>,
    ) -> Result<T, TransactionError<E>>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>
            + Send,
        T: Send,
        E: std::fmt::Display + std::fmt::Debug + Send,
    {
        self.db
            .transaction_with_config(callback, isolation_level, access_mode)
            .await
    }
}

/// Remove the password from the URL and replace it with `***`, if present.
///
/// If this is not a URL, or does not contain a password, this is a no-op.
fn strip_password(url: String) -> String {
    match Url::parse(&url) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => url,
    }
}
