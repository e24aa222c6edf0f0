use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "namespace")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: Option<String>,
    /// The version of the namespace, `unknown` when it couldn't be determined.
    pub version: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::layer_namespace::Entity")]
    LayerNamespace,
}

impl Related<super::layer_namespace::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LayerNamespace.def()
    }
}

impl Related<super::layer::Entity> for Entity {
    fn to() -> RelationDef {
        super::layer_namespace::Relation::Layer.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::layer_namespace::Relation::Namespace.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
