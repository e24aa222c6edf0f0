use crate::data::Query;
use sea_orm::{DbBackend, Statement};
use sea_orm_migration::prelude::*;
use std::fmt;

/// Statements issued by the multiple namespace migration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sql {
    ListNamespace,
    AddNamespaceVersion,
    SplitNamespace,
    ListVersionedNamespace,
    DropNamespaceVersion,
    JoinNamespace,

    CreateLayerNamespace,
    IndexLayerNamespaceByLayer,
    IndexLayerNamespaceByPair,
    ListLayerNamespaceColumn,
    InsertLayerNamespace,
    DropLayerNamespaceColumn,

    AddLayerNamespaceColumn,
    IndexLayerByNamespace,
    ListLayerNamespace,
    RestoreLayerNamespaceColumn,
    DropLayerNamespace,
}

impl fmt::Display for Sql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn raw(backend: DbBackend, sql: &str) -> Statement {
    Statement::from_string(backend, sql)
}

impl Query for Sql {
    fn statement(self, backend: DbBackend) -> Statement {
        match self {
            // namespace

            Self::ListNamespace => raw(backend, "SELECT id, name FROM namespace ORDER BY id"),
            Self::AddNamespaceVersion => backend.build(
                &Table::alter()
                    .table(Namespace::Table)
                    .add_column(ColumnDef::new(Namespace::Version).string_len(128).null())
                    .to_owned(),
            ),
            Self::SplitNamespace => raw(
                backend,
                "UPDATE namespace SET name = $2, version = $3 WHERE id = $1",
            ),
            Self::ListVersionedNamespace => raw(
                backend,
                "SELECT id, name, version FROM namespace ORDER BY id",
            ),
            Self::DropNamespaceVersion => backend.build(
                &Table::alter()
                    .table(Namespace::Table)
                    .drop_column(Namespace::Version)
                    .to_owned(),
            ),
            Self::JoinNamespace => raw(backend, "UPDATE namespace SET name = $2 WHERE id = $1"),

            // layer namespace, forward

            Self::CreateLayerNamespace => backend.build(
                &Table::create()
                    .table(LayerNamespace::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LayerNamespace::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LayerNamespace::LayerId).integer().not_null())
                    .col(
                        ColumnDef::new(LayerNamespace::NamespaceId)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from_col(LayerNamespace::LayerId)
                            .to(Layer::Table, Layer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from_col(LayerNamespace::NamespaceId)
                            .to(Namespace::Table, Namespace::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name(Indexes::LayernamespaceLayerIdNamespaceIdKey.to_string())
                            .unique()
                            .col(LayerNamespace::LayerId)
                            .col(LayerNamespace::NamespaceId),
                    )
                    .to_owned(),
            ),
            Self::IndexLayerNamespaceByLayer => backend.build(
                &Index::create()
                    .table(LayerNamespace::Table)
                    .name(Indexes::LayernamespaceLayerIdIdx.to_string())
                    .if_not_exists()
                    .col(LayerNamespace::LayerId)
                    .to_owned(),
            ),
            Self::IndexLayerNamespaceByPair => backend.build(
                &Index::create()
                    .table(LayerNamespace::Table)
                    .name(Indexes::LayernamespaceLayerIdNamespaceIdIdx.to_string())
                    .if_not_exists()
                    .col(LayerNamespace::LayerId)
                    .col(LayerNamespace::NamespaceId)
                    .to_owned(),
            ),
            Self::ListLayerNamespaceColumn => raw(
                backend,
                "SELECT id AS layer_id, namespace_id FROM layer WHERE namespace_id IS NOT NULL ORDER BY id",
            ),
            // a re-run after a partially applied migration finds some pairs already present
            Self::InsertLayerNamespace => raw(
                backend,
                "INSERT INTO layernamespace (layer_id, namespace_id) VALUES ($1, $2) ON CONFLICT (layer_id, namespace_id) DO NOTHING",
            ),
            Self::DropLayerNamespaceColumn => backend.build(
                &Table::alter()
                    .table(Layer::Table)
                    .drop_column(Layer::NamespaceId)
                    .to_owned(),
            ),

            // layer namespace, reverse

            Self::AddLayerNamespaceColumn => backend.build(
                &Table::alter()
                    .table(Layer::Table)
                    .add_column(ColumnDef::new(Layer::NamespaceId).integer().null())
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name(Indexes::LayerNamespaceIdFkey.to_string())
                            .from_tbl(Layer::Table)
                            .from_col(Layer::NamespaceId)
                            .to_tbl(Namespace::Table)
                            .to_col(Namespace::Id),
                    )
                    .to_owned(),
            ),
            Self::IndexLayerByNamespace => backend.build(
                &Index::create()
                    .table(Layer::Table)
                    .name(Indexes::LayerNamespaceIdIdx.to_string())
                    .if_not_exists()
                    .col(Layer::NamespaceId)
                    .to_owned(),
            ),
            Self::ListLayerNamespace => raw(
                backend,
                "SELECT layer_id, namespace_id FROM layernamespace ORDER BY layer_id, namespace_id",
            ),
            Self::RestoreLayerNamespaceColumn => raw(
                backend,
                "UPDATE layer SET namespace_id = $2 WHERE id = $1",
            ),
            Self::DropLayerNamespace => backend.build(
                &Table::drop()
                    .table(LayerNamespace::Table)
                    .if_exists()
                    .cascade()
                    .to_owned(),
            ),
        }
    }
}

#[derive(DeriveIden)]
enum Namespace {
    Table,
    Id,
    Version,
}

#[derive(DeriveIden)]
enum Layer {
    Table,
    Id,
    NamespaceId,
}

#[derive(DeriveIden)]
enum LayerNamespace {
    #[sea_orm(iden = "layernamespace")]
    Table,
    Id,
    LayerId,
    NamespaceId,
}

#[derive(DeriveIden)]
enum Indexes {
    LayernamespaceLayerIdNamespaceIdKey,
    LayernamespaceLayerIdIdx,
    LayernamespaceLayerIdNamespaceIdIdx,
    LayerNamespaceIdIdx,
    LayerNamespaceIdFkey,
}
