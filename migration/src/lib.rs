pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_geography_and_schools;
mod m20250301_000002_create_questionnaires_and_recoltes;
mod m20250301_000003_create_accounts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_geography_and_schools::Migration),
            Box::new(m20250301_000002_create_questionnaires_and_recoltes::Migration),
            Box::new(m20250301_000003_create_accounts::Migration),
        ]
    }
}
