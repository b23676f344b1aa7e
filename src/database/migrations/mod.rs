use sea_orm_migration::prelude::*;

mod m001_reference_tables;
mod m002_plan_tables;
mod m003_seed_reference_data;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m001_reference_tables::Migration),
            Box::new(m002_plan_tables::Migration),
            Box::new(m003_seed_reference_data::Migration),
        ]
    }
}
