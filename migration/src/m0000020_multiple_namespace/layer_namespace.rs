//! Move the namespace of a layer into the `layernamespace` association table.

use super::Sql;
use crate::{
    data::{alter, read, write},
    error::MigrationError,
};
use sea_orm::{ConnectionTrait, FromQueryResult};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, FromQueryResult)]
struct Association {
    layer_id: i32,
    namespace_id: i32,
}

/// Distinct `(layer_id, namespace_id)` pairs, ordered.
fn distinct(associations: impl IntoIterator<Item = Association>) -> BTreeSet<(i32, i32)> {
    associations
        .into_iter()
        .map(|a| (a.layer_id, a.namespace_id))
        .collect()
}

/// Collapse associations into at most one namespace per layer.
///
/// A layer can only reference a single namespace, so all but the lowest namespace id of a
/// layer get lost. Returns the namespace per layer, and the number of dropped associations.
fn collapse(
    associations: impl IntoIterator<Item = Association>,
) -> (BTreeMap<i32, i32>, usize) {
    let mut result = BTreeMap::<i32, i32>::new();
    let mut dropped = 0;

    for Association {
        layer_id,
        namespace_id,
    } in associations
    {
        match result.get_mut(&layer_id) {
            Some(current) => {
                dropped += 1;
                if namespace_id < *current {
                    *current = namespace_id;
                }
            }
            None => {
                result.insert(layer_id, namespace_id);
            }
        }
    }

    (result, dropped)
}

/// Create the association table and its indexes, unless they already exist.
pub async fn create_table<C: ConnectionTrait>(tx: &C) -> Result<(), MigrationError> {
    alter(tx, Sql::CreateLayerNamespace).await?;
    alter(tx, Sql::IndexLayerNamespaceByLayer).await?;
    alter(tx, Sql::IndexLayerNamespaceByPair).await?;
    Ok(())
}

pub async fn apply<C: ConnectionTrait>(tx: &C) -> Result<(), MigrationError> {
    create_table(tx).await?;

    let associations: Vec<Association> = read(tx, Sql::ListLayerNamespaceColumn).await?;
    let found = associations.len();
    let pairs = distinct(associations);

    if pairs.len() != found {
        log::warn!(
            "ignoring {} duplicate layer namespace associations",
            found - pairs.len()
        );
    }

    for (layer_id, namespace_id) in &pairs {
        write(
            tx,
            Sql::InsertLayerNamespace,
            [(*layer_id).into(), (*namespace_id).into()],
        )
        .await?;
    }

    // must be last, a failure before leaves the column in place
    alter(tx, Sql::DropLayerNamespaceColumn).await?;

    log::info!("moved {} layer namespace associations", pairs.len());

    Ok(())
}

pub async fn rollback<C: ConnectionTrait>(tx: &C) -> Result<(), MigrationError> {
    alter(tx, Sql::AddLayerNamespaceColumn).await?;
    alter(tx, Sql::IndexLayerByNamespace).await?;

    let associations: Vec<Association> = read(tx, Sql::ListLayerNamespace).await?;
    let (namespaces, dropped) = collapse(associations);

    if dropped > 0 {
        log::warn!(
            "layers can only hold a single namespace, dropping {dropped} layer namespace associations"
        );
    }

    for (layer_id, namespace_id) in &namespaces {
        write(
            tx,
            Sql::RestoreLayerNamespaceColumn,
            [(*layer_id).into(), (*namespace_id).into()],
        )
        .await?;
    }

    alter(tx, Sql::DropLayerNamespace).await?;

    log::info!("restored the namespace of {} layers", namespaces.len());

    Ok(())
}
