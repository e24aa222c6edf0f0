pub use sea_orm_migration::prelude::*;

pub mod data;
pub mod error;

mod m0000010_init;
pub mod m0000020_multiple_namespace;

pub use error::MigrationError;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m0000010_init::Migration),
            Box::new(m0000020_multiple_namespace::Migration),
        ]
    }
}

pub struct Now;

impl Iden for Now {
    fn unquoted(&self, s: &mut dyn Write) {
        write!(s, "now").unwrap()
    }
}
