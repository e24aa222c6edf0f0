use crate::data::Direction;
use sea_orm::DbErr;

/// Failure of a data migration step.
///
/// Every variant names the statement (or step) that failed, so that the runner can report
/// more than just the database error.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("schema alteration '{statement}' failed: {source}")]
    Schema {
        statement: String,
        #[source]
        source: DbErr,
    },
    #[error("reading '{statement}' failed: {source}")]
    Read {
        statement: String,
        #[source]
        source: DbErr,
    },
    #[error("writing '{statement}' failed: {source}")]
    Write {
        statement: String,
        #[source]
        source: DbErr,
    },
    #[error("transaction of step '{step}' ({direction}) failed: {source}")]
    Transaction {
        step: &'static str,
        direction: Direction,
        #[source]
        source: DbErr,
    },
}

impl MigrationError {
    /// The name of the statement which failed, if the failure was caused by a statement.
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::Schema { statement, .. }
            | Self::Read { statement, .. }
            | Self::Write { statement, .. } => Some(statement),
            Self::Transaction { .. } => None,
        }
    }
}

impl From<MigrationError> for DbErr {
    fn from(value: MigrationError) -> Self {
        DbErr::Migration(value.to_string())
    }
}
