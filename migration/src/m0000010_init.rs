use crate::Now;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Namespace::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Namespace::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // not unique, names are shared by the versions of a namespace
                    .col(ColumnDef::new(Namespace::Name).string_len(128).null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Layer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Layer::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Layer::Name)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Layer::EngineVersion).small_integer().not_null())
                    .col(ColumnDef::new(Layer::ParentId).integer().null())
                    .col(ColumnDef::new(Layer::NamespaceId).integer().null())
                    .col(
                        ColumnDef::new(Layer::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Func::cust(Now)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from_col(Layer::ParentId)
                            .to(Layer::Table, Layer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from_col(Layer::NamespaceId)
                            .to(Namespace::Table, Namespace::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Layer::Table)
                    .name(Indexes::LayerParentIdIdx.to_string())
                    .if_not_exists()
                    .col(Layer::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Layer::Table)
                    .name(Indexes::LayerNamespaceIdIdx.to_string())
                    .if_not_exists()
                    .col(Layer::NamespaceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Layer::Table).if_exists().to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Namespace::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Namespace {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Layer {
    Table,
    Id,
    Name,
    #[sea_orm(iden = "engineversion")]
    EngineVersion,
    ParentId,
    NamespaceId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Indexes {
    LayerParentIdIdx,
    LayerNamespaceIdIdx,
}
