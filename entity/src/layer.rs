use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "layer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_name = "engineversion")]
    pub engine_version: i16,
    pub parent_id: Option<i32>,
    pub created_at: Option<TimeDateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
    #[sea_orm(has_many = "super::layer_namespace::Entity")]
    LayerNamespace,
}

impl Related<super::layer_namespace::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LayerNamespace.def()
    }
}

impl Related<super::namespace::Entity> for Entity {
    fn to() -> RelationDef {
        super::layer_namespace::Relation::Namespace.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::layer_namespace::Relation::Layer.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
