//! Allow a layer to be associated with multiple namespaces.
//!
//! Namespaces get a dedicated version column, split off the `name:version` identifier. The
//! namespace reference of a layer moves into the `layernamespace` association table.

use crate::{
    data::{Direction, Step, StepRunner},
    error::MigrationError,
};
use sea_orm::{ConnectionTrait, DatabaseTransaction};
use sea_orm_migration::prelude::*;

pub mod layer_namespace;
pub mod namespace;
mod sql;

pub use sql::Sql;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.run_step(&MultipleNamespace, Direction::Apply).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .run_step(&MultipleNamespace, Direction::Rollback)
            .await
    }
}

pub struct MultipleNamespace;

impl Step for MultipleNamespace {
    fn name(&self) -> &'static str {
        "multiple_namespace"
    }

    async fn apply(&self, tx: &DatabaseTransaction) -> Result<(), MigrationError> {
        apply(tx).await
    }

    async fn rollback(&self, tx: &DatabaseTransaction) -> Result<(), MigrationError> {
        rollback(tx).await
    }
}

/// Split namespace identifiers, and move layer namespaces into the association table.
pub async fn apply<C: ConnectionTrait>(tx: &C) -> Result<(), MigrationError> {
    namespace::apply(tx).await?;
    layer_namespace::apply(tx).await?;
    Ok(())
}

/// Restore the layer namespace column, and join namespace identifiers.
///
/// This is lossy: layers associated with more than one namespace keep only one of them.
pub async fn rollback<C: ConnectionTrait>(tx: &C) -> Result<(), MigrationError> {
    layer_namespace::rollback(tx).await?;
    namespace::rollback(tx).await?;
    Ok(())
}
