use crate::error::MigrationError;
use sea_orm::{
    ConnectionTrait, DatabaseTransaction, DbBackend, DbErr, FromQueryResult, Statement,
    TransactionTrait, Value, Values,
};
use sea_orm_migration::SchemaManager;
use std::fmt;

#[cfg(test)]
pub(crate) mod test;

/// The direction a step is run in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Move schema and data to the new shape.
    Apply,
    /// Restore the old shape.
    Rollback,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply => write!(f, "apply"),
            Self::Rollback => write!(f, "rollback"),
        }
    }
}

/// A named statement, issued by a data migration.
///
/// The name ends up in errors, so that a failure can be tracked down to the statement which
/// caused it.
pub trait Query: Copy + fmt::Display + Send + Sync {
    /// Render the statement for a backend, without any values bound.
    fn statement(self, backend: DbBackend) -> Statement;
}

/// Run a query and decode all of its rows.
///
/// The result is fully collected before returning. The transport can't interleave statements
/// on one connection, so no cursor may be open when the next statement gets issued.
pub async fn read<T, C, Q>(tx: &C, query: Q) -> Result<Vec<T>, MigrationError>
where
    T: FromQueryResult + Send,
    C: ConnectionTrait,
    Q: Query,
{
    let stmt = query.statement(tx.get_database_backend());
    log::debug!("{query}: {}", stmt.sql);

    T::find_by_statement(stmt)
        .all(tx)
        .await
        .map_err(|source| MigrationError::Read {
            statement: query.to_string(),
            source,
        })
}

/// Run a schema alteration.
pub async fn alter<C, Q>(tx: &C, query: Q) -> Result<(), MigrationError>
where
    C: ConnectionTrait,
    Q: Query,
{
    let stmt = query.statement(tx.get_database_backend());
    log::debug!("{query}: {}", stmt.sql);

    tx.execute(stmt)
        .await
        .map(|_| ())
        .map_err(|source| MigrationError::Schema {
            statement: query.to_string(),
            source,
        })
}

/// Run a data modification, returning the number of affected rows.
pub async fn write<C, Q, I>(tx: &C, query: Q, values: I) -> Result<u64, MigrationError>
where
    C: ConnectionTrait,
    Q: Query,
    I: IntoIterator<Item = Value>,
{
    let mut stmt = query.statement(tx.get_database_backend());
    stmt.values = Some(Values(values.into_iter().collect()));

    tx.execute(stmt)
        .await
        .map(|result| result.rows_affected())
        .map_err(|source| MigrationError::Write {
            statement: query.to_string(),
            source,
        })
}

/// A reversible data migration.
///
/// Implementations work on the transaction they get handed. They must neither commit nor
/// roll it back, that is done by [`run`].
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(&self, tx: &DatabaseTransaction) -> Result<(), MigrationError>;

    async fn rollback(&self, tx: &DatabaseTransaction) -> Result<(), MigrationError>;
}

/// Run a step inside its own transaction.
///
/// If `db` already is a transaction, this results in a savepoint. The transaction is committed
/// when the step succeeds, and rolled back otherwise.
pub async fn run<C, S>(db: &C, step: &S, direction: Direction) -> Result<(), MigrationError>
where
    C: TransactionTrait,
    S: Step,
{
    let transaction = |source| MigrationError::Transaction {
        step: step.name(),
        direction,
        source,
    };

    let tx = db.begin().await.map_err(transaction)?;

    log::info!("running step '{}' ({direction})", step.name());

    let result = match direction {
        Direction::Apply => step.apply(&tx).await,
        Direction::Rollback => step.rollback(&tx).await,
    };

    match result {
        Ok(()) => {
            tx.commit().await.map_err(transaction)?;
            log::info!("step '{}' ({direction}) done", step.name());
            Ok(())
        }
        Err(err) => {
            log::warn!("step '{}' ({direction}) failed: {err}", step.name());
            if let Err(rollback) = tx.rollback().await {
                log::warn!("failed to roll back step '{}': {rollback}", step.name());
            }
            Err(err)
        }
    }
}

pub trait StepRunner {
    async fn run_step<S>(&self, step: &S, direction: Direction) -> Result<(), DbErr>
    where
        S: Step;
}

impl StepRunner for SchemaManager<'_> {
    async fn run_step<S>(&self, step: &S, direction: Direction) -> Result<(), DbErr>
    where
        S: Step,
    {
        run(self.get_connection(), step, direction)
            .await
            .map_err(|err| {
                DbErr::Migration(format!("step '{}' ({direction}): {err}", step.name()))
            })
    }
}
